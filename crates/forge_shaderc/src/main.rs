//! Forge shader build tool
//!
//! Three commands over the forge_shader pipeline:
//! - `compile` — compile every entry point of one source file into an
//!   intermediate header of C-array fragments
//! - `table`   — aggregate intermediate headers into the engine's shader
//!   table (declaration + definition artifacts)
//! - `reload`  — recompile a single entry point and push it to a running
//!   engine process via the asset server
//!
//! Run with: cargo run --bin forge-shaderc -- <command> [args]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use forge_shader::{ShaderCompiler, ShaderReloader, ShaderTable};

const USAGE: &str = "\
forge-shaderc - Forge Engine shader build tool

USAGE:
    forge-shaderc compile <source> -o <output> [--dxc <path>]
    forge-shaderc table --output-header <file> --output-source <file> --inputs <file>...
    forge-shaderc reload <source> <entry_point> [--server <host:port>] [--dxc <path>]

Shader sources are .vsh, .psh, .csh, or .rtsh (vertex, pixel, compute,
ray-tracing). The dxc path defaults to $FORGE_DXC, then `dxc` on PATH.
The reload server defaults to 127.0.0.1:8000.";

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    let result = match command.as_str() {
        "compile" => run_compile(&args[1..]),
        "table" => run_table(&args[1..]),
        "reload" => run_reload(&args[1..]),
        "help" | "--help" | "-h" => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        other => {
            eprintln!("Unknown command '{other}'\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Usage(message)) => {
            eprintln!("{message}\n\n{USAGE}");
            ExitCode::from(2)
        }
        Err(CliError::Shader(error)) => {
            log::error!("{error}");
            ExitCode::FAILURE
        }
        Err(CliError::Io(context, error)) => {
            log::error!("{context}: {error}");
            ExitCode::FAILURE
        }
    }
}

enum CliError {
    Usage(String),
    Shader(forge_shader::ShaderError),
    Io(String, std::io::Error),
}

impl From<forge_shader::ShaderError> for CliError {
    fn from(error: forge_shader::ShaderError) -> Self {
        Self::Shader(error)
    }
}

fn run_compile(args: &[String]) -> Result<(), CliError> {
    let mut source = None;
    let mut output = None;
    let mut dxc = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-o" | "--output" => output = Some(PathBuf::from(flag_value(&mut iter, arg)?)),
            "--dxc" => dxc = Some(PathBuf::from(flag_value(&mut iter, arg)?)),
            _ if source.is_none() => source = Some(PathBuf::from(arg)),
            other => return Err(CliError::Usage(format!("Unexpected argument '{other}'"))),
        }
    }

    let source = source.ok_or_else(|| CliError::Usage("Missing <source>".into()))?;
    let output = output.ok_or_else(|| CliError::Usage("Missing -o <output>".into()))?;

    let compiler = make_compiler(dxc);
    let header = compiler.compile_file(&source)?;
    write_artifact(&output, &header)?;
    log::info!("Wrote intermediate header {output:?}");
    Ok(())
}

fn run_table(args: &[String]) -> Result<(), CliError> {
    let mut output_header = None;
    let mut output_source = None;
    let mut inputs: Vec<PathBuf> = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--output-header" => {
                output_header = Some(PathBuf::from(flag_value(&mut iter, arg)?));
            }
            "--output-source" => {
                output_source = Some(PathBuf::from(flag_value(&mut iter, arg)?));
            }
            "--inputs" => {
                // Everything after --inputs is an input, in table order.
                inputs.extend(iter.by_ref().map(PathBuf::from));
            }
            other => return Err(CliError::Usage(format!("Unexpected argument '{other}'"))),
        }
    }

    let output_header =
        output_header.ok_or_else(|| CliError::Usage("Missing --output-header".into()))?;
    let output_source =
        output_source.ok_or_else(|| CliError::Usage("Missing --output-source".into()))?;
    if inputs.is_empty() {
        return Err(CliError::Usage("Missing --inputs <file>...".into()));
    }

    let mut fragments = Vec::with_capacity(inputs.len());
    for input in &inputs {
        let text = fs::read_to_string(input)
            .map_err(|e| CliError::Io(format!("Failed to read {input:?}"), e))?;
        fragments.push(text);
    }

    let table = ShaderTable::from_inputs(&fragments);
    log::info!(
        "Shader table: {} entries from {} input(s)",
        table.len(),
        inputs.len()
    );

    let header_name = output_header
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("shader_table.h")
        .to_string();

    write_artifact(&output_header, &table.render_declaration())?;
    write_artifact(&output_source, &table.render_definition(&header_name))?;
    Ok(())
}

fn run_reload(args: &[String]) -> Result<(), CliError> {
    let mut positional: Vec<&String> = Vec::new();
    let mut server = forge_shader::reload::DEFAULT_SERVER.to_string();
    let mut dxc = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--server" => server = flag_value(&mut iter, arg)?.clone(),
            "--dxc" => dxc = Some(PathBuf::from(flag_value(&mut iter, arg)?)),
            _ if positional.len() < 2 => positional.push(arg),
            other => return Err(CliError::Usage(format!("Unexpected argument '{other}'"))),
        }
    }

    let (source, entry_point) = match positional.as_slice() {
        [source, entry_point] => (source.as_str(), entry_point.as_str()),
        _ => return Err(CliError::Usage("Expected <source> <entry_point>".into())),
    };

    let reloader = ShaderReloader::new(make_compiler(dxc), server);
    reloader.reload(Path::new(source), entry_point)?;
    println!("Hot reloaded shader!");
    Ok(())
}

fn flag_value<'a>(
    iter: &mut std::slice::Iter<'a, String>,
    flag: &str,
) -> Result<&'a String, CliError> {
    iter.next()
        .ok_or_else(|| CliError::Usage(format!("{flag} requires a value")))
}

fn make_compiler(dxc: Option<PathBuf>) -> ShaderCompiler {
    match dxc {
        Some(path) => ShaderCompiler::new(path),
        None => ShaderCompiler::from_env(),
    }
}

fn write_artifact(path: &Path, contents: &str) -> Result<(), CliError> {
    fs::write(path, contents).map_err(|e| CliError::Io(format!("Failed to write {path:?}"), e))
}
