//! Shader kinds and their per-kind compiler mappings
//!
//! The profile string, entry-point prefix, and source extension for each
//! kind live here as `match` arms so the correspondence is enforced by the
//! compiler rather than by parallel tables.

use std::path::Path;

use crate::ShaderError;

/// Shader pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Vertex,
    Pixel,
    Compute,
    RayTracing,
}

impl ShaderKind {
    /// All kinds, in prefix-table order
    pub const ALL: [ShaderKind; 4] = [
        ShaderKind::Vertex,
        ShaderKind::Pixel,
        ShaderKind::Compute,
        ShaderKind::RayTracing,
    ];

    /// dxc target profile string
    pub fn profile(self) -> &'static str {
        match self {
            Self::Vertex => "vs_6_6",
            Self::Pixel => "ps_6_6",
            Self::Compute => "cs_6_6",
            Self::RayTracing => "lib_6_6",
        }
    }

    /// Required entry-point name prefix
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Vertex => "VS_",
            Self::Pixel => "PS_",
            Self::Compute => "CS_",
            Self::RayTracing => "RT_",
        }
    }

    /// Source file extension (without the dot)
    pub fn extension(self) -> &'static str {
        match self {
            Self::Vertex => "vsh",
            Self::Pixel => "psh",
            Self::Compute => "csh",
            Self::RayTracing => "rtsh",
        }
    }

    /// Ray-tracing shaders compile as a whole library, with no `-E` flag
    pub fn is_library(self) -> bool {
        matches!(self, Self::RayTracing)
    }

    /// Map a source file path to its shader kind by extension.
    ///
    /// This is the only validation applied to user input before any
    /// compiler invocation is attempted.
    pub fn from_path(path: &Path) -> Result<Self, ShaderError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::ALL
            .into_iter()
            .find(|kind| kind.extension() == extension)
            .ok_or_else(|| ShaderError::UnrecognizedShaderKind {
                path: path.to_path_buf(),
            })
    }

    /// Map an entry-point symbol to its shader kind by name prefix
    pub fn from_entry_point(entry_point: &str) -> Result<Self, ShaderError> {
        Self::ALL
            .into_iter()
            .find(|kind| entry_point.starts_with(kind.prefix()))
            .ok_or_else(|| ShaderError::UnknownEntryPointPrefix {
                entry_point: entry_point.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(
            ShaderKind::from_path(Path::new("shaders/basic.vsh")).unwrap(),
            ShaderKind::Vertex
        );
        assert_eq!(
            ShaderKind::from_path(Path::new("tonemap.psh")).unwrap(),
            ShaderKind::Pixel
        );
        assert_eq!(
            ShaderKind::from_path(Path::new("cull.csh")).unwrap(),
            ShaderKind::Compute
        );
        assert_eq!(
            ShaderKind::from_path(Path::new("gi_probe.rtsh")).unwrap(),
            ShaderKind::RayTracing
        );
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = ShaderKind::from_path(Path::new("legacy.glsl")).unwrap_err();
        match err {
            crate::ShaderError::UnrecognizedShaderKind { path } => {
                assert_eq!(path, PathBuf::from("legacy.glsl"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_kind_from_entry_point() {
        assert_eq!(
            ShaderKind::from_entry_point("VS_Basic").unwrap(),
            ShaderKind::Vertex
        );
        assert_eq!(
            ShaderKind::from_entry_point("RT_GiProbe").unwrap(),
            ShaderKind::RayTracing
        );
        assert!(ShaderKind::from_entry_point("XX_Foo").is_err());
    }

    #[test]
    fn test_profile_prefix_correspondence() {
        assert_eq!(ShaderKind::Vertex.profile(), "vs_6_6");
        assert_eq!(ShaderKind::Pixel.profile(), "ps_6_6");
        assert_eq!(ShaderKind::Compute.profile(), "cs_6_6");
        assert_eq!(ShaderKind::RayTracing.profile(), "lib_6_6");
        for kind in ShaderKind::ALL {
            assert_eq!(kind.prefix().len(), 3);
            assert!(kind.prefix().ends_with('_'));
        }
    }

    #[test]
    fn test_only_ray_tracing_is_library() {
        assert!(ShaderKind::RayTracing.is_library());
        assert!(!ShaderKind::Vertex.is_library());
        assert!(!ShaderKind::Pixel.is_library());
        assert!(!ShaderKind::Compute.is_library());
    }
}
