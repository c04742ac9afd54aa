//! Stack frame identity.
//!
//! A frame is one location in a captured call stack. Two frames are the
//! same identity when their image base name and function name match;
//! that pair is the dedup key used by the call tree builder and the
//! flamegraph frame table.

use crate::utils::config::SYSTEM_IMAGE_PREFIXES;
use serde::{Deserialize, Serialize};
use std::hash::Hasher;

/// One frame as produced by the profile normalization layer
///
/// Producers disagree on key names, so each field accepts a second key
/// (`name`, `image`, `abs_path`, `line`). When both keys are present the
/// first non-empty one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawFrame")]
pub struct Frame {
    /// Function name (empty when unsymbolicated)
    #[serde(rename = "function")]
    pub name: String,

    /// Owning module/image, possibly an absolute path
    #[serde(rename = "package")]
    pub image: String,

    /// Source file path
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,

    /// Source line
    #[serde(rename = "lineno", skip_serializing_if = "is_zero")]
    pub line: u32,

    /// Raw instruction address, usually hex
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction_addr: Option<String>,

    /// Application (true) vs system (false) code, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_app: Option<bool>,
}

/// Wire shape of a frame with every accepted key kept apart
#[derive(Deserialize)]
struct RawFrame {
    #[serde(default)]
    function: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    package: String,
    #[serde(default)]
    image: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    abs_path: String,
    #[serde(default)]
    lineno: u32,
    #[serde(default)]
    line: u32,
    #[serde(default)]
    instruction_addr: Option<String>,
    #[serde(default)]
    in_app: Option<bool>,
}

fn first_non_empty(primary: String, fallback: String) -> String {
    if primary.is_empty() {
        fallback
    } else {
        primary
    }
}

impl From<RawFrame> for Frame {
    fn from(raw: RawFrame) -> Self {
        Self {
            name: first_non_empty(raw.function, raw.name),
            image: first_non_empty(raw.package, raw.image),
            path: first_non_empty(raw.path, raw.abs_path),
            line: if raw.lineno > 0 { raw.lineno } else { raw.line },
            instruction_addr: raw.instruction_addr,
            in_app: raw.in_app,
        }
    }
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl Frame {
    /// Create a frame from a function name and image
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ..Self::default()
        }
    }

    pub fn with_application(mut self, in_app: bool) -> Self {
        self.in_app = Some(in_app);
        self
    }

    pub fn is_application(&self) -> bool {
        self.in_app.unwrap_or(false)
    }

    /// Image name without any directory components
    pub fn image_base_name(&self) -> &str {
        image_base_name(&self.image)
    }

    /// Identity key: `(image base name, function name)`
    pub fn identity(&self) -> (&str, &str) {
        (self.image_base_name(), &self.name)
    }

    /// Feed this frame's identity into a running path hash
    pub fn write_to_hash<H: Hasher>(&self, hasher: &mut H) {
        hasher.write(self.image_base_name().as_bytes());
        hasher.write_u8(0);
        hasher.write(self.name.as_bytes());
        hasher.write_u8(0);
    }

    /// Fill in `in_app` from the image path when the profile left it out
    pub fn normalize(&mut self) {
        if self.in_app.is_none() && !self.image.is_empty() {
            self.in_app = Some(!is_system_image(&self.image));
        }
    }
}

/// Strip filesystem path components from an image identifier
///
/// Handles both `/` and `\` separators so that frames captured from
/// different install locations of the same module compare equal.
pub fn image_base_name(image: &str) -> &str {
    image
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(image)
}

fn is_system_image(image: &str) -> bool {
    SYSTEM_IMAGE_PREFIXES
        .iter()
        .any(|prefix| image.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_base_name() {
        assert_eq!(
            image_base_name("/usr/lib/system/libdispatch.dylib"),
            "libdispatch.dylib"
        );
        assert_eq!(image_base_name("C:\\Program Files\\app\\core.dll"), "core.dll");
        assert_eq!(image_base_name("test.package"), "test.package");
        assert_eq!(image_base_name(""), "");
    }

    #[test]
    fn test_identity_ignores_install_path() {
        let a = Frame::new("main", "/opt/app/bin/app");
        let b = Frame::new("main", "/home/user/app/bin/app");
        assert_eq!(a.identity(), b.identity());
        assert_ne!(a, b);
    }

    #[test]
    fn test_deserialize_sentry_frame() {
        let frame: Frame = serde_json::from_str(
            r#"{
                "function": "_dispatch_event_loop_leave_immediate",
                "in_app": false,
                "instruction_addr": "0x1c44cfe34",
                "package": "/usr/lib/system/libdispatch.dylib",
                "status": "symbolicated"
            }"#,
        )
        .unwrap();

        assert_eq!(frame.name, "_dispatch_event_loop_leave_immediate");
        assert_eq!(frame.image_base_name(), "libdispatch.dylib");
        assert_eq!(frame.instruction_addr.as_deref(), Some("0x1c44cfe34"));
        assert!(!frame.is_application());
    }

    #[test]
    fn test_deserialize_accepts_both_key_spellings() {
        let frame: Frame = serde_json::from_str(
            r#"{
                "function": "run",
                "path": "src/run.rs",
                "abs_path": "/home/user/app/src/run.rs",
                "lineno": 12,
                "line": 40
            }"#,
        )
        .unwrap();
        assert_eq!(frame.path, "src/run.rs");
        assert_eq!(frame.line, 12);

        let frame: Frame = serde_json::from_str(
            r#"{"name": "run", "image": "app", "path": "", "abs_path": "/src/run.rs", "line": 40}"#,
        )
        .unwrap();
        assert_eq!(frame.name, "run");
        assert_eq!(frame.image, "app");
        assert_eq!(frame.path, "/src/run.rs");
        assert_eq!(frame.line, 40);
    }

    #[test]
    fn test_serialized_frame_reads_back() {
        let frame = Frame {
            path: "src/run.rs".to_string(),
            line: 7,
            ..Frame::new("run", "app").with_application(true)
        };

        let decoded: Frame = serde_json::from_value(serde_json::to_value(&frame).unwrap()).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_normalize_infers_in_app() {
        let mut system = Frame::new("objc_msgSend", "/usr/lib/libobjc.A.dylib");
        system.normalize();
        assert_eq!(system.in_app, Some(false));

        let mut app = Frame::new("viewDidLoad", "/private/var/containers/MyApp");
        app.normalize();
        assert_eq!(app.in_app, Some(true));

        let mut explicit = Frame::new("f", "/usr/lib/libc.so").with_application(true);
        explicit.normalize();
        assert_eq!(explicit.in_app, Some(true));

        let mut unknown = Frame::new("f", "");
        unknown.normalize();
        assert_eq!(unknown.in_app, None);
    }
}
