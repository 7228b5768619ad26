//! Integration tests for the shader build pipeline
//!
//! Covers the complete flow: entry-point extraction, per-entry-point
//! compilation (against a stub dxc), table aggregation across compilation
//! units, and hot-reload framing over a real loopback connection.

use forge_shader::{
    extract, table, HotReloadPacket, ShaderCompiler, ShaderError, ShaderKind, ShaderReloader,
    ShaderTable,
};
use std::path::Path;

const VERTEX_SOURCE: &str = r#"
struct VertexInput { float3 position : POSITION; };

float4 VS_Sky(uint id : SV_VertexID) : SV_Position
{
    return float4(0, 0, 0, 1);
}

float4 VS_Terrain(VertexInput input) : SV_Position
{
    return float4(input.position, 1);
}
"#;

const PIXEL_SOURCE: &str = r#"
float4 PS_Tonemap(float4 color : COLOR) : SV_Target
{
    return color;
}
"#;

fn fragment_for(symbol: &str) -> String {
    format!(
        "const unsigned char {}[] = {{ 0x44, 0x58, 0x42, 0x43 }};\n",
        table::shader_variable_name(symbol)
    )
}

#[test]
fn test_extraction_feeds_table_in_supply_order() {
    let vs = extract::entry_points(ShaderKind::Vertex, VERTEX_SOURCE, Path::new("sky.vsh"));
    let ps = extract::entry_points(ShaderKind::Pixel, PIXEL_SOURCE, Path::new("post.psh"));
    assert_eq!(vs, vec!["VS_Sky", "VS_Terrain"]);
    assert_eq!(ps, vec!["PS_Tonemap"]);

    // One intermediate header per source file, as compilation would emit.
    let vs_header: String = vs.iter().map(|s| fragment_for(s)).collect();
    let ps_header: String = ps.iter().map(|s| fragment_for(s)).collect();

    let table = ShaderTable::from_inputs(&[ps_header.clone(), vs_header.clone()]);
    assert_eq!(table.symbols(), ["PS_Tonemap", "VS_Sky", "VS_Terrain"]);

    // Supplying the units in the other order reorders the table; the
    // builder never sorts.
    let flipped = ShaderTable::from_inputs(&[vs_header, ps_header]);
    assert_eq!(flipped.symbols(), ["VS_Sky", "VS_Terrain", "PS_Tonemap"]);
}

#[test]
fn test_table_artifacts_are_idempotent() {
    let inputs = [fragment_for("VS_Sky"), fragment_for("RT_GiProbe")];
    let first = ShaderTable::from_inputs(&inputs);
    let second = ShaderTable::from_inputs(&inputs);
    assert_eq!(first.render_declaration(), second.render_declaration());
    assert_eq!(
        first.render_definition("shader_table.h"),
        second.render_definition("shader_table.h")
    );
}

#[test]
fn test_ray_tracing_symbol_flows_through() {
    let symbols = extract::entry_points(
        ShaderKind::RayTracing,
        "// library source, content ignored",
        Path::new("shaders/my_shader.rtsh"),
    );
    assert_eq!(symbols, vec!["RT_MyShader"]);

    let table = ShaderTable::from_inputs(&[fragment_for(&symbols[0])]);
    assert!(table.render_declaration().contains("  kRT_MyShader,\n"));
}

#[cfg(unix)]
mod with_stub_dxc {
    use super::*;
    use std::fs;
    use std::io::Read;
    use std::net::TcpListener;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Stub dxc: honors -Fh/-Fo/-Vn well enough to exercise the driver.
    const STUB_DXC: &str = r#"#!/bin/sh
out=""; var=""; prev=""
for a in "$@"; do
  case "$prev" in
    -Fh|-Fo) out="$a";;
    -Vn) var="$a";;
  esac
  prev="$a"
done
if [ -n "$var" ]; then
  printf 'const unsigned char %s[] = { 0x44, 0x58, 0x42, 0x43 };\n' "$var" > "$out"
else
  printf 'DXBC' > "$out"
fi
"#;

    const FAILING_DXC: &str = "#!/bin/sh\nexit 1\n";

    fn install_stub(dir: &TempDir, script: &str) -> PathBuf {
        let path = dir.path().join("dxc");
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_compile_file_concatenates_fragments_in_order() {
        let dir = TempDir::new().unwrap();
        let dxc = install_stub(&dir, STUB_DXC);
        let source = dir.path().join("sky.vsh");
        fs::write(&source, VERTEX_SOURCE).unwrap();

        let compiler = ShaderCompiler::new(&dxc);
        let header = compiler.compile_file(&source).unwrap();

        let sky = header.find("__kShaderSource__VS_Sky").unwrap();
        let terrain = header.find("__kShaderSource__VS_Terrain").unwrap();
        assert!(sky < terrain);

        let table = ShaderTable::from_inputs(&[header]);
        assert_eq!(table.symbols(), ["VS_Sky", "VS_Terrain"]);
    }

    #[test]
    fn test_compiler_failure_aborts_whole_unit() {
        let dir = TempDir::new().unwrap();
        let dxc = install_stub(&dir, FAILING_DXC);
        let source = dir.path().join("sky.vsh");
        fs::write(&source, VERTEX_SOURCE).unwrap();

        let compiler = ShaderCompiler::new(&dxc);
        match compiler.compile_file(&source) {
            Err(ShaderError::CompilationFailed {
                entry_point,
                source_path,
            }) => {
                assert_eq!(entry_point, "VS_Sky");
                assert_eq!(source_path, source);
            }
            other => panic!("expected CompilationFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_hot_reload_end_to_end() {
        let dir = TempDir::new().unwrap();
        let dxc = install_stub(&dir, STUB_DXC);
        let source = dir.path().join("post.psh");
        fs::write(&source, PIXEL_SOURCE).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut frame = Vec::new();
            socket.read_to_end(&mut frame).unwrap();
            frame
        });

        let reloader = ShaderReloader::new(ShaderCompiler::new(&dxc), addr.to_string());
        reloader.reload(&source, "PS_Tonemap").unwrap();

        let frame = server.join().unwrap();
        let packet = HotReloadPacket::decode(&frame).unwrap();
        assert_eq!(packet.entry_point, "PS_Tonemap");
        assert_eq!(packet.bytecode, b"DXBC");
    }

    #[test]
    fn test_failed_compile_performs_no_network_activity() {
        let dir = TempDir::new().unwrap();
        let dxc = install_stub(&dir, FAILING_DXC);
        let source = dir.path().join("post.psh");
        fs::write(&source, PIXEL_SOURCE).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        listener.set_nonblocking(true).unwrap();

        let reloader = ShaderReloader::new(ShaderCompiler::new(&dxc), addr.to_string());
        let err = reloader.reload(&source, "PS_Tonemap").unwrap_err();
        assert!(matches!(err, ShaderError::CompilationFailed { .. }));

        // Nothing ever connected.
        assert!(matches!(
            listener.accept(),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock
        ));
    }
}
