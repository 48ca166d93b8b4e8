use crate::contract::{self, ParamKind};
use crate::module::{LoadError, MEMORY_EXPORT, RENDER_EXPORT, sha256_hex};
use cubehost_common::ContractKind;
use serde::Serialize;
use wasmtime::{Engine, ExternType, FuncType, Module, ValType};

/// Static description of a module, produced without instantiating it.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleSummary {
    pub bytes: usize,
    pub sha256: String,
    pub imports: Vec<String>,
    pub exports: Vec<ExportInfo>,
    /// `render` parameter types, if the export exists and is a function.
    pub render_params: Option<Vec<String>>,
    pub render_results: Option<Vec<String>>,
    /// Initial pages of the `memory` export.
    pub memory_pages: Option<u64>,
    /// Contracts whose argument list fits the `render` signature.
    pub contracts: Vec<ContractKind>,
}

/// One export of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportInfo {
    pub name: String,
    pub kind: &'static str,
}

impl ModuleSummary {
    pub fn is_loadable(&self) -> bool {
        self.memory_pages.is_some() && !self.contracts.is_empty()
    }
}

impl std::fmt::Display for ModuleSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Module: {} bytes sha256={}", self.bytes, self.sha256)?;
        for export in &self.exports {
            writeln!(f, "  export {} ({})", export.name, export.kind)?;
        }
        for import in &self.imports {
            writeln!(f, "  import {import}")?;
        }
        match (&self.render_params, &self.render_results) {
            (Some(params), Some(results)) => writeln!(
                f,
                "  render({}) -> [{}]",
                params.join(", "),
                results.join(", ")
            )?,
            _ => writeln!(f, "  render: missing")?,
        }
        match self.memory_pages {
            Some(pages) => writeln!(f, "  memory: {pages} pages ({} KiB)", pages * 64)?,
            None => writeln!(f, "  memory: missing")?,
        }
        let contracts: Vec<&str> = self.contracts.iter().map(|c| c.name()).collect();
        if contracts.is_empty() {
            write!(f, "  contracts: none")
        } else {
            write!(f, "  contracts: {}", contracts.join(", "))
        }
    }
}

/// Compile a module and describe its imports, exports and `render` signature.
pub fn inspect(bytes: &[u8]) -> Result<ModuleSummary, LoadError> {
    let engine = Engine::default();
    let module = Module::new(&engine, bytes).map_err(LoadError::Compile)?;

    let imports = module
        .imports()
        .map(|i| format!("{}::{}", i.module(), i.name()))
        .collect();

    let mut exports = Vec::new();
    let mut render: Option<FuncType> = None;
    let mut memory_pages = None;
    for export in module.exports() {
        let ty = export.ty();
        let kind = match &ty {
            ExternType::Func(_) => "function",
            ExternType::Memory(_) => "memory",
            ExternType::Global(_) => "global",
            ExternType::Table(_) => "table",
            #[allow(unreachable_patterns)]
            _ => "other",
        };
        match ty {
            ExternType::Func(func) if export.name() == RENDER_EXPORT => render = Some(func),
            ExternType::Memory(mem) if export.name() == MEMORY_EXPORT => {
                memory_pages = Some(mem.minimum())
            }
            _ => {}
        }
        exports.push(ExportInfo {
            name: export.name().to_string(),
            kind,
        });
    }

    let contracts = match &render {
        Some(func) => matching_contracts(func),
        None => Vec::new(),
    };
    let type_names = |types: Vec<ValType>| -> Vec<String> {
        types.iter().map(val_type_name).collect()
    };

    Ok(ModuleSummary {
        bytes: bytes.len(),
        sha256: sha256_hex(bytes),
        imports,
        exports,
        render_params: render.as_ref().map(|f| type_names(f.params().collect())),
        render_results: render.as_ref().map(|f| type_names(f.results().collect())),
        memory_pages,
        contracts,
    })
}

fn matching_contracts(func: &FuncType) -> Vec<ContractKind> {
    let params: Option<Vec<ParamKind>> =
        func.params().map(|ty| ParamKind::from_val_type(&ty)).collect();
    let results: Vec<ValType> = func.results().collect();
    let (Some(params), [ValType::I32]) = (params, results.as_slice()) else {
        return Vec::new();
    };
    [ContractKind::Canonical, ContractKind::Legacy]
        .into_iter()
        .filter(|kind| contract::fields(*kind).len() == params.len())
        .collect()
}

fn val_type_name(ty: &ValType) -> String {
    match ParamKind::from_val_type(ty) {
        Some(kind) => kind.name().to_string(),
        None => format!("{ty:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY_WAT: &str = r#"
        (module
          (import "env" "abort" (func (param i32)))
          (memory (export "memory") 30)
          (global (export "heap_base") i32 (i32.const 1024))
          (func (export "render")
            (param i32 f32 f32 f32 i32 i32) (result i32)
            (i32.const 0)))
    "#;

    #[test]
    fn summary_of_legacy_module() {
        let summary = inspect(LEGACY_WAT.as_bytes()).unwrap();
        assert_eq!(summary.bytes, LEGACY_WAT.len());
        assert_eq!(summary.sha256.len(), 64);
        assert_eq!(summary.imports, vec!["env::abort"]);
        assert_eq!(summary.memory_pages, Some(30));
        assert_eq!(summary.contracts, vec![ContractKind::Legacy]);
        assert_eq!(
            summary.render_params.as_deref(),
            Some(&["i32", "f32", "f32", "f32", "i32", "i32"].map(String::from)[..])
        );
        assert!(summary.exports.contains(&ExportInfo {
            name: "heap_base".into(),
            kind: "global"
        }));
        assert!(summary.is_loadable());
    }

    #[test]
    fn missing_render_matches_nothing() {
        let summary = inspect(br#"(module (memory (export "memory") 1))"#).unwrap();
        assert!(summary.render_params.is_none());
        assert!(summary.contracts.is_empty());
        assert!(!summary.is_loadable());
        assert!(format!("{summary}").contains("render: missing"));
    }

    #[test]
    fn wrong_result_type_matches_nothing() {
        let wat = r#"
            (module
              (memory (export "memory") 1)
              (func (export "render") (param i32 f32 f32 f32 i32 i32)))
        "#;
        let summary = inspect(wat.as_bytes()).unwrap();
        assert_eq!(summary.render_results, Some(vec![]));
        assert!(summary.contracts.is_empty());
    }

    #[test]
    fn display_lists_signature() {
        let summary = inspect(LEGACY_WAT.as_bytes()).unwrap();
        let s = format!("{summary}");
        assert!(s.contains("render(i32, f32, f32, f32, i32, i32) -> [i32]"));
        assert!(s.contains("memory: 30 pages"));
        assert!(s.contains("contracts: legacy"));
    }

    #[test]
    fn invalid_bytes_fail() {
        let err = inspect(b"not wasm").unwrap_err();
        assert!(matches!(err, LoadError::Compile(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
