//! Import pipeline stages shared by the `map` and `import` commands.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, warn};

use roster_core::{
    BlockedImport, ExistingRecord, ImportError, ImportOptions, ImportOrchestrator,
    InMemoryIdentityIndex, TemplateDetection, detect_template,
};
use roster_ingest::{IngestedSheet, read_sheet};
use roster_map::{ConfirmedMapping, MappingRepository, MappingState};
use roster_model::{ImportIntent, ImportIssue, ImportResult, SchemaField};
use roster_standards::{EventSchema, TemplateRegistry, load_event_schema};

/// Schema fields an import runs against, and how they were chosen.
#[derive(Debug, Clone)]
pub struct LoadedSchema {
    pub fields: Vec<SchemaField>,
    pub template_id: Option<String>,
    /// Set when the template was guessed from the headers.
    pub detection: Option<TemplateDetection>,
}

/// Picks the event schema: an explicit schema file wins over a template
/// name, and without either the template is detected from `headers`.
pub fn load_schema(
    schema_path: Option<&Path>,
    template: Option<&str>,
    headers: &[String],
) -> Result<LoadedSchema> {
    if let Some(path) = schema_path {
        let schema = load_event_schema(path)
            .with_context(|| format!("load event schema {}", path.display()))?;
        return Ok(from_schema(schema, None));
    }
    let registry = TemplateRegistry::builtin();
    if let Some(name) = template {
        let template = registry.get(name).context("resolve template")?;
        let schema = EventSchema::assemble(template, Vec::new(), &[]).context("assemble schema")?;
        return Ok(from_schema(schema, None));
    }
    let detection = detect_template(headers, &registry)
        .ok_or_else(|| anyhow!("no sport templates are registered"))?;
    info!(
        template = %detection.template_id,
        confidence = %detection.confidence,
        matched = detection.matched_drills.len(),
        "template detected"
    );
    let template = registry
        .get(&detection.template_id)
        .context("resolve detected template")?;
    let schema = EventSchema::assemble(template, Vec::new(), &[]).context("assemble schema")?;
    Ok(from_schema(schema, Some(detection)))
}

fn from_schema(schema: EventSchema, detection: Option<TemplateDetection>) -> LoadedSchema {
    let template_id = schema.template_id.clone();
    LoadedSchema {
        fields: schema.into_fields(),
        template_id,
        detection,
    }
}

/// Reads the input file, attaching the path to any failure.
pub fn ingest(path: &Path, sheet: Option<&str>) -> Result<IngestedSheet> {
    let ingested = read_sheet(path, sheet).with_context(|| format!("read {}", path.display()))?;
    debug!(
        rows = ingested.sheet.row_count(),
        columns = ingested.sheet.headers.len(),
        issues = ingested.issues.len(),
        "sheet ingested"
    );
    Ok(ingested)
}

/// Loads import options from a TOML file, or the defaults.
pub fn load_options(path: Option<&Path>) -> Result<ImportOptions> {
    match path {
        Some(path) => Ok(ImportOptions::load(path)?),
        None => Ok(ImportOptions::default()),
    }
}

/// Builds an identity index from a JSON array of stored records.
pub fn load_existing(path: &Path) -> Result<InMemoryIdentityIndex> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let records: Vec<ExistingRecord> = serde_json::from_str(&contents)
        .with_context(|| format!("parse existing records in {}", path.display()))?;
    let index = InMemoryIdentityIndex::from_records(&records);
    debug!(records = records.len(), keys = index.len(), "existing records indexed");
    Ok(index)
}

pub fn load_confirmed_mapping(path: &Path) -> Result<ConfirmedMapping> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse mapping {}", path.display()))
}

pub fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize output")?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))
}

/// Proposes a mapping for `headers` and applies remembered mappings to the
/// columns the matcher was unsure about, in the order given.
pub fn review_mapping(
    orchestrator: &ImportOrchestrator<'_>,
    headers: &[String],
    remembered: &[ConfirmedMapping],
) -> MappingState {
    let options = orchestrator.options();
    let proposal = orchestrator.propose_mapping(headers);
    let mut state = MappingState::new(
        &options.event_id,
        orchestrator.fields().to_vec(),
        proposal,
    )
    .allow_shared_targets(options.allow_shared_targets);
    for mapping in remembered {
        let filled = state.fill_from_remembered(mapping);
        if filled > 0 {
            info!(filled, "remembered mapping applied");
        }
    }
    state
}

/// Inputs for one `import` run.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub file: PathBuf,
    pub sheet: Option<String>,
    pub intent: ImportIntent,
    pub schema_path: Option<PathBuf>,
    pub template: Option<String>,
    pub existing: Option<PathBuf>,
    pub options: ImportOptions,
    pub mapping: Option<PathBuf>,
    pub mappings_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

impl ImportRequest {
    pub fn new(file: impl Into<PathBuf>, intent: ImportIntent) -> Self {
        Self {
            file: file.into(),
            sheet: None,
            intent,
            schema_path: None,
            template: None,
            existing: None,
            options: ImportOptions::default(),
            mapping: None,
            mappings_dir: None,
            output: None,
        }
    }
}

/// Result of an `import` run that got as far as the engine.
#[derive(Debug, Clone)]
pub enum ImportOutcome {
    Completed {
        result: ImportResult,
        schema: LoadedSchema,
    },
    Blocked {
        blocked: BlockedImport,
        schema: LoadedSchema,
    },
}

/// Reads, maps and reconciles one file.
///
/// Blocking issues are returned as [`ImportOutcome::Blocked`]; only I/O and
/// configuration failures are errors. A completed import updates the
/// remembered mapping in `mappings_dir`.
pub fn run_import(request: &ImportRequest) -> Result<ImportOutcome> {
    let ingested = ingest(&request.file, request.sheet.as_deref())?;
    let schema = load_schema(
        request.schema_path.as_deref(),
        request.template.as_deref(),
        &ingested.sheet.headers,
    )?;

    let index = match &request.existing {
        Some(path) => load_existing(path)?,
        None => InMemoryIdentityIndex::new(),
    };

    let repository = request
        .mappings_dir
        .as_ref()
        .map(MappingRepository::new)
        .transpose()?;
    let mut remembered = Vec::new();
    if let Some(path) = &request.mapping {
        remembered.push(load_confirmed_mapping(path)?);
    }
    if let Some(repository) = &repository
        && let Some(mapping) = repository.load(&request.options.event_id)?
    {
        remembered.push(mapping);
    }

    let orchestrator = ImportOrchestrator::new(&schema.fields, request.options.clone());
    let state = review_mapping(&orchestrator, &ingested.sheet.headers, &remembered);
    let confirmed = state.to_confirmed();
    let mapping = state.into_mappings();

    match orchestrator.run_with_mapping(&ingested.sheet, &mapping, &index, request.intent) {
        Ok(mut result) => {
            attach_ingest_issues(&mut result, ingested.issues);
            if let Some(path) = &request.output {
                write_json(path, &result)?;
                info!(path = %path.display(), "import result written");
            }
            if let Some(repository) = &repository {
                repository.save(&confirmed)?;
            }
            Ok(ImportOutcome::Completed { result, schema })
        }
        Err(ImportError::Blocked(blocked)) => {
            warn!(issues = blocked.issues.len(), "import blocked");
            Ok(ImportOutcome::Blocked {
                blocked: *blocked,
                schema,
            })
        }
        Err(error) => Err(error.into()),
    }
}

/// Puts each ingest issue on the outcome of the row it came from. Issues
/// without a matching row stay sheet-level.
fn attach_ingest_issues(result: &mut ImportResult, issues: Vec<ImportIssue>) {
    for issue in issues {
        let outcome = issue
            .row
            .and_then(|line| result.rows.iter_mut().find(|outcome| outcome.row == line));
        match outcome {
            Some(outcome) => outcome.issues.push(issue),
            None => result.mapping_issues.push(issue),
        }
    }
}
