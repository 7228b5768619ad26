//! Shader compilation via the external dxc compiler
//!
//! One dxc invocation per entry point. Each invocation writes its output to
//! a scratch file which is read back into memory and removed; the scratch
//! identity is per-invocation, so invocations never collide.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::extract;
use crate::kind::ShaderKind;
use crate::table;
use crate::ShaderError;

/// Environment variable overriding the dxc executable path
pub const DXC_PATH_ENV: &str = "FORGE_DXC";

/// HLSL language version passed to every invocation
const HLSL_VERSION: &str = "2021";

/// Driver for the external dxc compiler
pub struct ShaderCompiler {
    dxc_path: PathBuf,
}

impl ShaderCompiler {
    /// Create a compiler using the given dxc executable
    pub fn new(dxc_path: impl Into<PathBuf>) -> Self {
        Self {
            dxc_path: dxc_path.into(),
        }
    }

    /// Create a compiler from `FORGE_DXC`, falling back to `dxc` on PATH
    pub fn from_env() -> Self {
        let dxc_path = std::env::var_os(DXC_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("dxc"));
        Self::new(dxc_path)
    }

    /// Path of the dxc executable this compiler invokes
    pub fn dxc_path(&self) -> &Path {
        &self.dxc_path
    }

    /// Compile every entry point of one source file into an intermediate
    /// header: the concatenation of the per-entry-point C-array fragments,
    /// in discovery order.
    ///
    /// Fails on the first entry point that does not compile; no partial
    /// output is returned.
    pub fn compile_file(&self, source_path: &Path) -> Result<String, ShaderError> {
        let kind = ShaderKind::from_path(source_path)?;
        let source_text = fs::read_to_string(source_path)?;
        let entry_points = extract::entry_points(kind, &source_text, source_path);

        log::info!(
            "Compiling {:?} ({} entry point(s))",
            source_path,
            entry_points.len()
        );

        let mut header = String::new();
        for entry_point in &entry_points {
            header.push_str(&self.compile_entry_point(source_path, kind, entry_point)?);
        }
        Ok(header)
    }

    /// Compile one entry point to its C-array text fragment, embedded under
    /// the generated variable name for the symbol.
    fn compile_entry_point(
        &self,
        source_path: &Path,
        kind: ShaderKind,
        entry_point: &str,
    ) -> Result<String, ShaderError> {
        let scratch = tempfile::Builder::new()
            .prefix("forge_shader_")
            .suffix(".h")
            .tempfile()?
            .into_temp_path();

        let variable = table::shader_variable_name(entry_point);

        let mut cmd = Command::new(&self.dxc_path);
        cmd.arg("-T").arg(kind.profile());
        if !kind.is_library() {
            cmd.arg("-E").arg(entry_point);
        }
        cmd.arg(source_path)
            .arg("-Zi")
            .arg("-Qembed_debug")
            .arg("-HV")
            .arg(HLSL_VERSION)
            .arg("-Fh")
            .arg(&*scratch)
            .arg("-Vn")
            .arg(&variable);

        log::debug!("Running {:?}", cmd);
        let status = cmd.status()?;
        if !status.success() {
            return Err(ShaderError::CompilationFailed {
                entry_point: entry_point.to_string(),
                source_path: source_path.to_path_buf(),
            });
        }

        let fragment = fs::read_to_string(&scratch)?;
        log::debug!("Compiled {} ({} bytes of fragment)", entry_point, fragment.len());
        Ok(fragment)
    }

    /// Compile one explicit entry point to a raw binary object, for hot
    /// reload. The shader kind comes from the entry-point prefix, not the
    /// file extension.
    pub fn compile_object(
        &self,
        source_path: &Path,
        entry_point: &str,
    ) -> Result<Vec<u8>, ShaderError> {
        let kind = ShaderKind::from_entry_point(entry_point)?;
        let scratch = tempfile::Builder::new()
            .prefix("forge_shader_")
            .suffix(".bin")
            .tempfile()?
            .into_temp_path();

        let mut cmd = Command::new(&self.dxc_path);
        cmd.arg("-T").arg(kind.profile());
        if !kind.is_library() {
            cmd.arg("-E").arg(entry_point);
        }
        cmd.arg(source_path)
            .arg("-Zi")
            .arg("-Qembed_debug")
            .arg("-HV")
            .arg(HLSL_VERSION)
            .arg("-enable-16bit-types")
            .arg("-Fo")
            .arg(&*scratch);

        log::debug!("Running {:?}", cmd);
        let status = cmd.status()?;
        if !status.success() {
            return Err(ShaderError::CompilationFailed {
                entry_point: entry_point.to_string(),
                source_path: source_path.to_path_buf(),
            });
        }

        Ok(fs::read(&scratch)?)
    }
}
