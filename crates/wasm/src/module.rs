use crate::contract::{self, ParamKind};
use cubehost_common::{ContractKind, FrameRequest, HostConfig, SurfaceSize};
use cubehost_render::{Frame, RenderError, RenderModule};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use wasmtime::{Engine, Func, Linker, Memory, Module, Store, Val, ValType};

/// Name of the exported render entry point.
pub const RENDER_EXPORT: &str = "render";

/// Name of the exported linear memory holding the frame.
pub const MEMORY_EXPORT: &str = "memory";

/// Errors from loading and binding a module.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("module failed to compile")]
    Compile(#[source] wasmtime::Error),
    #[error("module needs imports the host does not provide: {}", .0.join(", "))]
    UnresolvedImports(Vec<String>),
    #[error("module failed to instantiate")]
    Instantiate(#[source] wasmtime::Error),
    #[error("module has no exported {kind} named `{name}`")]
    MissingExport {
        name: &'static str,
        kind: &'static str,
    },
    #[error("`render` takes {actual} parameters, the {contract} contract passes {expected}")]
    ArityMismatch {
        contract: ContractKind,
        expected: usize,
        actual: usize,
    },
    #[error("`render` parameter {index} has unsupported type {ty}")]
    UnsupportedParam { index: usize, ty: String },
    #[error("`render` must return a single i32, found [{0}]")]
    BadResult(String),
}

/// How to bind a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub contract: ContractKind,
    pub surface: SurfaceSize,
    pub trap_unknown_imports: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::from(&HostConfig::default())
    }
}

impl From<&HostConfig> for LoadOptions {
    fn from(config: &HostConfig) -> Self {
        Self {
            contract: config.contract,
            surface: config.surface,
            trap_unknown_imports: config.trap_unknown_imports,
        }
    }
}

/// An instantiated external render module.
pub struct WasmModule {
    store: Store<()>,
    render: Func,
    memory: Memory,
    params: Vec<ParamKind>,
    options: LoadOptions,
    digest: String,
}

impl std::fmt::Debug for WasmModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmModule")
            .field("params", &self.params)
            .field("options", &self.options)
            .field("digest", &self.digest)
            .finish_non_exhaustive()
    }
}

impl WasmModule {
    /// Read, compile and instantiate a module file.
    pub fn load(path: impl AsRef<Path>, options: LoadOptions) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let module = Self::from_bytes(&bytes, options)?;
        tracing::info!(
            path = %path.display(),
            bytes = bytes.len(),
            sha256 = %&module.digest[..16],
            contract = %options.contract,
            "render module loaded"
        );
        Ok(module)
    }

    /// Compile and instantiate a module from binary or text format.
    pub fn from_bytes(bytes: &[u8], options: LoadOptions) -> Result<Self, LoadError> {
        let engine = Engine::default();
        let module = Module::new(&engine, bytes).map_err(LoadError::Compile)?;

        let mut linker: Linker<()> = Linker::new(&engine);
        let imports: Vec<String> = module
            .imports()
            .map(|i| format!("{}::{}", i.module(), i.name()))
            .collect();
        if !imports.is_empty() {
            if !options.trap_unknown_imports {
                return Err(LoadError::UnresolvedImports(imports));
            }
            tracing::warn!(?imports, "stubbing module imports with traps");
            linker
                .define_unknown_imports_as_traps(&module)
                .map_err(LoadError::Instantiate)?;
        }

        let mut store = Store::new(&engine, ());
        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(LoadError::Instantiate)?;

        let render = instance
            .get_func(&mut store, RENDER_EXPORT)
            .ok_or(LoadError::MissingExport {
                name: RENDER_EXPORT,
                kind: "function",
            })?;
        let memory = instance
            .get_memory(&mut store, MEMORY_EXPORT)
            .ok_or(LoadError::MissingExport {
                name: MEMORY_EXPORT,
                kind: "memory",
            })?;

        let params = bind_params(&render.ty(&store), options.contract)?;

        Ok(Self {
            store,
            render,
            memory,
            params,
            options,
            digest: sha256_hex(bytes),
        })
    }

    /// Hex SHA-256 of the module bytes.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn contract(&self) -> ContractKind {
        self.options.contract
    }

    /// Parameter types of the bound `render` export.
    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    /// Current size of the module's linear memory in bytes.
    pub fn memory_len(&self) -> usize {
        self.memory.data_size(&self.store)
    }

    /// Call `render` and return the offset it reports.
    fn call(&mut self, request: &FrameRequest) -> Result<u32, RenderError> {
        let args = contract::encode_request(self.options.contract, &self.params, request);
        let mut results = [Val::I32(0)];
        self.render
            .call(&mut self.store, &args, &mut results)
            .map_err(|e| RenderError::Call(e.into()))?;
        match results[0] {
            Val::I32(offset) => Ok(offset as u32),
            ref other => Err(RenderError::BadReturn(format!("{other:?}"))),
        }
    }
}

impl RenderModule for WasmModule {
    fn surface(&self) -> SurfaceSize {
        self.options.surface
    }

    fn render(&mut self, request: &FrameRequest) -> Result<Frame<'_>, RenderError> {
        let offset = self.call(request)?;
        let size = self.options.surface;
        Frame::from_memory(self.memory.data(&self.store), offset, size)
    }
}

/// Check the export's signature against the contract.
fn bind_params(ty: &wasmtime::FuncType, contract: ContractKind) -> Result<Vec<ParamKind>, LoadError> {
    let params = ty
        .params()
        .enumerate()
        .map(|(index, ty)| {
            ParamKind::from_val_type(&ty).ok_or_else(|| LoadError::UnsupportedParam {
                index,
                ty: format!("{ty:?}"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let expected = contract::fields(contract).len();
    if params.len() != expected {
        return Err(LoadError::ArityMismatch {
            contract,
            expected,
            actual: params.len(),
        });
    }

    let results: Vec<ValType> = ty.results().collect();
    if !matches!(results.as_slice(), [ValType::I32]) {
        let found: Vec<String> = results.iter().map(|r| format!("{r:?}")).collect();
        return Err(LoadError::BadResult(found.join(", ")));
    }

    Ok(params)
}

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
