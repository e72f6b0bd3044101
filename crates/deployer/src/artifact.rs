//! Lookup of compiled contracts in a Hardhat artifacts directory.
//!
//! Hardhat writes one JSON file per contract to
//! `<artifacts>/<source name>/<contract name>.json`, next to a `.dbg.json`
//! file pointing into `build-info/`. Only the former are of interest here.

use {
    alloy::{
        dyn_abi::{JsonAbiExt, Specifier},
        json_abi::JsonAbi,
        primitives::Bytes,
    },
    anyhow::{Context, Result, anyhow, bail, ensure},
    serde::Deserialize,
    serde_json::Value,
    std::{
        collections::BTreeMap,
        fs,
        path::{Path, PathBuf},
    },
};

const BUILD_INFO_DIR: &str = "build-info";

/// Everything needed to deploy a contract: its interface and creation code.
#[derive(Debug, Clone, PartialEq)]
pub struct Factory {
    contract_name: String,
    source_name: String,
    abi: JsonAbi,
    bytecode: Bytes,
}

impl Factory {
    pub fn new(contract_name: &str, source_name: &str, abi: JsonAbi, bytecode: Bytes) -> Self {
        Self {
            contract_name: contract_name.to_owned(),
            source_name: source_name.to_owned(),
            abi,
            bytecode,
        }
    }

    pub fn contract_name(&self) -> &str {
        &self.contract_name
    }

    /// Name unique across all artifacts, e.g. `contracts/Lock.sol:Lock`.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    /// Creation code followed by the ABI encoded constructor arguments.
    ///
    /// Each argument is parsed as the Solidity type of the constructor
    /// parameter at the same position, so `"42"` works for a `uint256` and
    /// `"0x..."` for an `address`.
    pub fn deploy_code(&self, args: &[String]) -> Result<Bytes> {
        let Some(constructor) = &self.abi.constructor else {
            ensure!(
                args.is_empty(),
                "{} has no constructor but {} argument(s) were given",
                self.contract_name,
                args.len()
            );
            return Ok(self.bytecode.clone());
        };
        ensure!(
            constructor.inputs.len() == args.len(),
            "{} expects {} constructor argument(s) but {} were given",
            self.contract_name,
            constructor.inputs.len(),
            args.len()
        );

        let values = constructor
            .inputs
            .iter()
            .zip(args)
            .map(|(param, arg)| {
                let ty = param.resolve().with_context(|| {
                    format!("unsupported type {} of parameter {}", param.ty, param.name)
                })?;
                ty.coerce_str(arg)
                    .with_context(|| format!("invalid value {arg:?} for parameter {}", param.name))
            })
            .collect::<Result<Vec<_>>>()?;
        let encoded = constructor
            .abi_encode_input(&values)
            .context("failed to encode constructor arguments")?;

        let mut code = self.bytecode.to_vec();
        code.extend(encoded);
        Ok(code.into())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Artifact {
    contract_name: String,
    source_name: String,
    abi: JsonAbi,
    bytecode: String,
    #[serde(default)]
    link_references: BTreeMap<String, BTreeMap<String, Value>>,
}

impl TryFrom<Artifact> for Factory {
    type Error = anyhow::Error;

    fn try_from(artifact: Artifact) -> Result<Self> {
        let name = format!("{}:{}", artifact.source_name, artifact.contract_name);
        if !artifact.link_references.is_empty() {
            let libraries = artifact
                .link_references
                .iter()
                .flat_map(|(source, libraries)| {
                    libraries.keys().map(move |library| format!("{source}:{library}"))
                })
                .collect::<Vec<_>>();
            bail!("{name} needs to be linked against {}", libraries.join(", "));
        }
        let bytecode: Bytes = artifact
            .bytecode
            .parse()
            .with_context(|| format!("malformed bytecode in artifact of {name}"))?;
        ensure!(
            !bytecode.is_empty(),
            "{name} is abstract or an interface and can not be deployed"
        );

        Ok(Self {
            contract_name: artifact.contract_name,
            source_name: artifact.source_name,
            abi: artifact.abi,
            bytecode,
        })
    }
}

/// Resolves contract names to factories from a Hardhat artifacts directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Accepts a bare contract name, which has to be unique across all
    /// compiled sources, or a fully qualified `<source>:<contract>` name.
    pub fn resolve(&self, name: &str) -> Result<Factory> {
        let path = match name.rsplit_once(':') {
            Some((source, contract)) => {
                let path = self.root.join(source).join(format!("{contract}.json"));
                ensure!(
                    path.is_file(),
                    "artifact for {name} not found at {}, are the contracts compiled?",
                    path.display()
                );
                path
            }
            None => self.find_unique(name)?,
        };
        tracing::debug!(?path, "loading contract artifact");

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read artifact {}", path.display()))?;
        let artifact: Artifact = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse artifact {}", path.display()))?;
        ensure!(
            name.rsplit(':').next() == Some(artifact.contract_name.as_str()),
            "artifact {} describes {} instead of {name}",
            path.display(),
            artifact.contract_name
        );
        Factory::try_from(artifact)
    }

    fn find_unique(&self, contract: &str) -> Result<PathBuf> {
        ensure!(
            self.root.is_dir(),
            "artifacts directory {} does not exist, are the contracts compiled?",
            self.root.display()
        );
        let file_name = format!("{contract}.json");
        let mut matches = Vec::new();
        collect_artifacts(&self.root, &file_name, &mut matches)?;
        matches.sort();

        match matches.len() {
            0 => Err(anyhow!(
                "artifact for {contract} not found in {}, are the contracts compiled?",
                self.root.display()
            )),
            1 => Ok(matches.remove(0)),
            _ => {
                let candidates = matches
                    .iter()
                    .filter_map(|path| {
                        let source = path.parent()?.strip_prefix(&self.root).ok()?;
                        Some(format!("{}:{contract}", source.display()))
                    })
                    .collect::<Vec<_>>();
                Err(anyhow!(
                    "multiple artifacts named {contract}, use one of the fully qualified names: {}",
                    candidates.join(", ")
                ))
            }
        }
    }
}

fn collect_artifacts(dir: &Path, file_name: &str, matches: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        // Symlinked directories are not followed, they could form a cycle.
        if entry.file_type()?.is_dir() {
            if path.file_name().is_some_and(|name| name == BUILD_INFO_DIR) {
                continue;
            }
            collect_artifacts(&path, file_name, matches)?;
        } else if path.file_name().is_some_and(|name| name == file_name) {
            matches.push(path);
        }
    }
    Ok(())
}
