//! # Forge Shader
//!
//! Shader build pipeline for Forge Engine providing:
//! - Entry-point discovery from HLSL-style shader source
//! - Bytecode compilation via the external `dxc` compiler
//! - Shader-table generation (enum + parallel lookup arrays)
//! - Hot-reload of a single shader into a running engine process
//!
//! ## Architecture
//!
//! ```text
//! Source Files (.vsh/.psh/.csh/.rtsh)
//!        │
//!        ▼
//!   Extractor ──► entry points ──► Compiler (dxc) ──► fragments ──► TableBuilder ──► enum + arrays
//!                                       │
//!                                       ▼ (single entry point, binary object)
//!                                  Reloader ──► HotReloadPacket ──► asset server
//! ```

pub mod compile;
pub mod extract;
pub mod kind;
pub mod packet;
pub mod reload;
pub mod table;

pub use compile::ShaderCompiler;
pub use kind::ShaderKind;
pub use packet::{HotReloadPacket, PacketType, PACKET_MAGIC, PACKET_VERSION};
pub use reload::ShaderReloader;
pub use table::ShaderTable;

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the shader build pipeline
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("unrecognized shader kind for {path:?} (expected .vsh, .psh, .csh, or .rtsh)")]
    UnrecognizedShaderKind { path: PathBuf },

    #[error("entry point '{entry_point}' matches no known prefix (VS_, PS_, CS_, RT_)")]
    UnknownEntryPointPrefix { entry_point: String },

    #[error("failed to compile {entry_point} ({source_path:?})")]
    CompilationFailed {
        entry_point: String,
        source_path: PathBuf,
    },

    #[error("failed to reach asset server at {server}: {source}")]
    ConnectionFailed {
        server: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
