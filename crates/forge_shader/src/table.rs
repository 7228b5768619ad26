//! Shader table generation
//!
//! Takes the intermediate headers produced by compilation, discovers every
//! embedded `__kShaderSource__<Symbol>` variable, and renders the engine's
//! lookup table: an index enum plus pointer and size arrays addressed by
//! it. Discovery order is occurrence order over the concatenated input, so
//! the table is deterministic for a given input sequence. No sorting, no
//! deduplication.

/// Variable-name prefix dxc is told to embed each fragment under
pub const SHADER_VARIABLE_PREFIX: &str = "__kShaderSource__";

/// Generated variable name for an entry-point symbol
pub fn shader_variable_name(symbol: &str) -> String {
    format!("{SHADER_VARIABLE_PREFIX}{symbol}")
}

/// Scan text for generated variable names and return the captured
/// entry-point symbols in occurrence order.
///
/// The single place that knows how symbols are recovered from generated
/// text; a naming-scheme change touches only this function and
/// [`shader_variable_name`].
pub fn discover_symbols(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let pat = SHADER_VARIABLE_PREFIX.as_bytes();
    let mut symbols = Vec::new();
    let mut pos = 0;

    while pos + pat.len() <= bytes.len() {
        let Some(offset) = bytes[pos..]
            .windows(pat.len())
            .position(|w| w == pat)
        else {
            break;
        };
        let start = pos + offset + pat.len();
        let mut end = start;
        while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
            end += 1;
        }
        if end > start {
            symbols.push(text[start..end].to_string());
            pos = end;
        } else {
            pos = start;
        }
    }
    symbols
}

/// Aggregated shader table over one or more intermediate headers
pub struct ShaderTable {
    symbols: Vec<String>,
    source: String,
}

impl ShaderTable {
    /// Build a table from intermediate headers, in the order supplied.
    pub fn from_inputs<S: AsRef<str>>(inputs: &[S]) -> Self {
        let source: String = inputs.iter().map(|s| s.as_ref()).collect();
        let symbols = discover_symbols(&source);
        log::debug!("Shader table: {} symbol(s) discovered", symbols.len());
        Self { symbols, source }
    }

    /// Discovered symbols, one per table row, in ordinal order
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Render the declaration artifact: the index enum with its trailing
    /// count sentinel plus extern declarations for both arrays.
    pub fn render_declaration(&self) -> String {
        let mut enums = String::new();
        for symbol in &self.symbols {
            enums.push_str("  k");
            enums.push_str(symbol);
            enums.push_str(",\n");
        }
        format!(
            "#pragma once\n\
             enum EngineShaderIndex\n\
             {{\n\
             {enums}  kEngineShaderCount,\n\
             }};\n\
             extern const unsigned char* kEngineShaderBinSrcs[];\n\
             extern const size_t kEngineShaderBinSizes[];"
        )
    }

    /// Render the definition artifact: include of the declaration header,
    /// the concatenated bytecode definitions, then the pointer and size
    /// arrays in the same order as the enum.
    pub fn render_definition(&self, header_name: &str) -> String {
        let mut pointers = String::new();
        let mut sizes = String::new();
        for symbol in &self.symbols {
            let variable = shader_variable_name(symbol);
            pointers.push_str("  ");
            pointers.push_str(&variable);
            pointers.push_str(",\n");
            sizes.push_str("  sizeof(");
            sizes.push_str(&variable);
            sizes.push_str("),\n");
        }
        format!(
            "#include \"{header_name}\"\n\
             {source}\n\
             const unsigned char* kEngineShaderBinSrcs[] = \n\
             {{\n\
             {pointers}}};\n\
             const size_t kEngineShaderBinSizes[] = \n\
             {{\n\
             {sizes}}};\n",
            source = self.source,
        )
    }
}
