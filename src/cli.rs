//! Command-line interface implementation

use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{
    default_config, find_config, load_config_file, merge_cli_overrides, project_root,
    resolve_path, CardConfig, CliOverrides, ConfigError,
};
use crate::icons::{evaluate_slots, resolve_icons, IconCatalog};
use crate::models::{normalize_entity, EntityData};
use crate::output::{card_file_name, generate_output_path, save_html};
use crate::parser::{parse, ParseError};
use crate::registry::{CardError, DirectoryStore, MemoryStore, TemplateRegistry, TemplateStore};

/// Exit codes
const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_INVALID_ARGS: u8 = 2;

/// Cardsrc - Render digital business cards from templates and entity data
#[derive(Parser)]
#[command(name = "card")]
#[command(about = "Cardsrc - Render digital business cards from templates and entity data")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a card to HTML
    Render {
        /// Template: a file path, a template id from the template directory, or @builtin
        template: String,

        /// Entity data (JSON)
        #[arg(short, long)]
        data: PathBuf,

        /// Icon catalog (JSON array); defaults to the configured catalog
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output file or directory (ends with /). Prints to stdout if omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Strict mode: treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Template directory (overrides card.toml)
        #[arg(long)]
        templates: Option<PathBuf>,

        /// CSS class of the icon grid wrapper (overrides card.toml)
        #[arg(long)]
        icon_grid_class: Option<String>,

        /// Path to card.toml (discovered if omitted)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check templates for structural errors
    Validate {
        /// Template files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show which icons an entity gets, in order
    Icons {
        /// Entity data (JSON)
        #[arg(short, long)]
        data: PathBuf,

        /// Icon catalog (JSON array); defaults to the configured catalog
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// List every catalog slot with its enabled state
        #[arg(long)]
        all: bool,

        /// Path to card.toml (discovered if omitted)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Render an entity with every available template
    Gallery {
        /// Entity data (JSON)
        #[arg(short, long)]
        data: PathBuf,

        /// Output directory (defaults to the configured output directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Icon catalog (JSON array); defaults to the configured catalog
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Strict mode: treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Template directory (overrides card.toml)
        #[arg(long)]
        templates: Option<PathBuf>,

        /// Path to card.toml (discovered if omitted)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List available template ids
    Templates {
        /// Template directory (overrides card.toml)
        #[arg(long)]
        templates: Option<PathBuf>,

        /// Path to card.toml (discovered if omitted)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            template,
            data,
            catalog,
            output,
            strict,
            templates,
            icon_grid_class,
            config,
        } => {
            let overrides = CliOverrides {
                templates,
                strict: strict.then_some(true),
                icon_grid_class,
                ..Default::default()
            };
            run_render(
                &template,
                &data,
                catalog.as_deref(),
                output.as_deref(),
                config.as_deref(),
                &overrides,
            )
        }
        Commands::Validate { files } => run_validate(&files),
        Commands::Icons { data, catalog, all, config } => {
            run_icons(&data, catalog.as_deref(), all, config.as_deref())
        }
        Commands::Gallery { data, output, catalog, strict, templates, config } => {
            let overrides = CliOverrides {
                templates,
                out: output,
                strict: strict.then_some(true),
                ..Default::default()
            };
            run_gallery(&data, catalog.as_deref(), config.as_deref(), &overrides)
        }
        Commands::Templates { templates, config } => {
            let overrides = CliOverrides { templates, ..Default::default() };
            run_templates(config.as_deref(), &overrides)
        }
    }
}

/// Configuration with project-relative directories resolved.
struct Project {
    config: CardConfig,
    templates_dir: PathBuf,
    out_dir: PathBuf,
}

impl Project {
    fn registry(&self, store: impl TemplateStore + 'static) -> TemplateRegistry {
        TemplateRegistry::new(store)
            .with_options(self.config.render.options())
            .with_strict(self.config.render.strict)
    }
}

fn load_project(
    config_path: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<Project, ConfigError> {
    let found = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => find_config(),
    };

    let (mut config, root) = match &found {
        Some(path) => {
            let root = project_root(path).map(Path::to_path_buf).unwrap_or_default();
            (load_config_file(path)?, root)
        }
        None => (default_config(), PathBuf::new()),
    };

    // Directories from card.toml are relative to the file; CLI paths to the working directory.
    let templates_dir = match &overrides.templates {
        Some(dir) => dir.clone(),
        None => resolve_path(&root, &config.project.templates),
    };
    let out_dir = match &overrides.out {
        Some(dir) => dir.clone(),
        None => resolve_path(&root, &config.project.out),
    };

    merge_cli_overrides(&mut config, overrides);
    Ok(Project { config, templates_dir, out_dir })
}

/// Load the project or report why not.
fn project_or_exit(
    config_path: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<Project, ExitCode> {
    load_project(config_path, overrides).map_err(|e| {
        eprintln!("Error: {}", e);
        ExitCode::from(EXIT_ERROR)
    })
}

/// Read an entity record, renaming legacy fields.
fn load_entity(path: &Path) -> Result<Value, ExitCode> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        eprintln!("Error: Cannot read data file '{}': {}", path.display(), e);
        ExitCode::from(EXIT_INVALID_ARGS)
    })?;

    let value: Value = serde_json::from_str(&contents).map_err(|e| {
        eprintln!("Error: Cannot parse data file '{}': {}", path.display(), e);
        ExitCode::from(EXIT_INVALID_ARGS)
    })?;

    Ok(normalize_entity(value))
}

/// The catalog from `--catalog`, or the configured one.
fn load_catalog(path: Option<&Path>, config: &CardConfig) -> Result<IconCatalog, ExitCode> {
    let Some(path) = path else {
        return Ok(config.catalog());
    };

    let contents = std::fs::read_to_string(path).map_err(|e| {
        eprintln!("Error: Cannot read catalog '{}': {}", path.display(), e);
        ExitCode::from(EXIT_INVALID_ARGS)
    })?;

    let catalog = IconCatalog::from_json(&contents).map_err(|e| {
        eprintln!("Error: Cannot parse catalog '{}': {}", path.display(), e);
        ExitCode::from(EXIT_INVALID_ARGS)
    })?;

    let issues = catalog.validate();
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("Error: {}: {}", path.display(), issue);
        }
        return Err(ExitCode::from(EXIT_ERROR));
    }

    Ok(catalog)
}

/// Print a structural template error as `name:line:col: message`.
fn report_parse_error(name: &str, source: &str, error: &ParseError) {
    let (line, col) = error.line_col(source);
    eprintln!("Error: {}:{}:{}: {}", name, line, col, error.kind);
    if let Some(hint) = error.suggestion() {
        eprintln!("  {}", hint);
    }
}

/// Print a render failure; returns the exit code to use.
fn report_card_error(registry: &TemplateRegistry, error: &CardError) -> ExitCode {
    match error {
        CardError::Parse { template_id, source } => {
            match registry.source(template_id) {
                Ok(text) => report_parse_error(template_id, &text, source),
                Err(_) => eprintln!("Error: {}", error),
            }
            ExitCode::from(EXIT_ERROR)
        }
        CardError::Strict { template_id, warnings } => {
            for warning in warnings {
                eprintln!("Error: {}: {}", template_id, warning);
            }
            ExitCode::from(EXIT_ERROR)
        }
        CardError::NotFound { .. } => {
            eprintln!("Error: {}", error);
            ExitCode::from(EXIT_INVALID_ARGS)
        }
        CardError::Io { .. } => {
            eprintln!("Error: {}", error);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Execute the render command
fn run_render(
    template: &str,
    data: &Path,
    catalog: Option<&Path>,
    output: Option<&Path>,
    config: Option<&Path>,
    overrides: &CliOverrides,
) -> ExitCode {
    let project = match project_or_exit(config, overrides) {
        Ok(project) => project,
        Err(code) => return code,
    };
    let entity = match load_entity(data) {
        Ok(entity) => entity,
        Err(code) => return code,
    };
    let catalog = match load_catalog(catalog, &project.config) {
        Ok(catalog) => catalog,
        Err(code) => return code,
    };

    // A template given as a file path is served on its own; anything else is an id.
    let template_path = Path::new(template);
    let registry = if !template.starts_with('@') && template_path.is_file() {
        match std::fs::read_to_string(template_path) {
            Ok(source) => project.registry(MemoryStore::new().with(template, source)),
            Err(e) => {
                eprintln!("Error: Cannot read template '{}': {}", template, e);
                return ExitCode::from(EXIT_INVALID_ARGS);
            }
        }
    } else {
        project.registry(DirectoryStore::new(&project.templates_dir))
    };

    let result = match registry.render_card(template, &entity, &catalog) {
        Ok(result) => result,
        Err(e) => return report_card_error(&registry, &e),
    };

    for warning in &result.warnings {
        eprintln!("Warning: {}", warning);
    }

    match output {
        Some(output) => {
            let output_path = generate_output_path(data, template, output);
            if let Err(e) = save_html(&result.output, &output_path) {
                eprintln!("Error: Failed to save '{}': {}", output_path.display(), e);
                return ExitCode::from(EXIT_ERROR);
            }
            println!("Saved: {}", output_path.display());
        }
        None => print!("{}", result.output),
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Execute the validate command
fn run_validate(files: &[PathBuf]) -> ExitCode {
    let mut failed = 0;

    for file in files {
        let name = file.display().to_string();
        let source = match std::fs::read_to_string(file) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("Error: Cannot read '{}': {}", name, e);
                failed += 1;
                continue;
            }
        };

        match parse(&source) {
            Ok(template) => {
                if template.has_icon_grid() {
                    println!("OK: {}", name);
                } else {
                    println!("OK: {} (no {{{{icon_grid}}}})", name);
                }
            }
            Err(e) => {
                report_parse_error(&name, &source, &e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        eprintln!("{} of {} template(s) failed validation", failed, files.len());
        return ExitCode::from(EXIT_ERROR);
    }
    ExitCode::from(EXIT_SUCCESS)
}

/// Execute the icons command
fn run_icons(data: &Path, catalog: Option<&Path>, all: bool, config: Option<&Path>) -> ExitCode {
    let project = match project_or_exit(config, &CliOverrides::default()) {
        Ok(project) => project,
        Err(code) => return code,
    };
    let entity = match load_entity(data) {
        Ok(entity) => entity,
        Err(code) => return code,
    };
    let catalog = match load_catalog(catalog, &project.config) {
        Ok(catalog) => catalog,
        Err(code) => return code,
    };

    let (entity, warnings) = EntityData::from_value(&entity);
    for warning in &warnings {
        eprintln!("Warning: {}", warning);
    }

    if all {
        for slot in evaluate_slots(&catalog, &entity) {
            let state = if slot.enabled { "on" } else { "off" };
            println!("{}\t{}\t{}\t{}", state, slot.id, slot.category.as_str(), slot.label);
        }
    } else {
        for icon in resolve_icons(&catalog, &entity) {
            println!("{}\t{}\t{}", icon.slot.id, icon.label, icon.href);
        }
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Execute the gallery command
fn run_gallery(
    data: &Path,
    catalog: Option<&Path>,
    config: Option<&Path>,
    overrides: &CliOverrides,
) -> ExitCode {
    let project = match project_or_exit(config, overrides) {
        Ok(project) => project,
        Err(code) => return code,
    };
    let entity = match load_entity(data) {
        Ok(entity) => entity,
        Err(code) => return code,
    };
    let catalog = match load_catalog(catalog, &project.config) {
        Ok(catalog) => catalog,
        Err(code) => return code,
    };

    let registry = project.registry(DirectoryStore::new(&project.templates_dir));
    let ids = registry.ids();

    let results: Vec<(String, Result<String, CardError>)> = ids
        .par_iter()
        .map(|id| {
            let rendered = registry.render_card(id, &entity, &catalog).map(|result| {
                for warning in &result.warnings {
                    eprintln!("Warning: {}: {}", id, warning);
                }
                result.output
            });
            (id.clone(), rendered)
        })
        .collect();

    let mut failed = 0;
    for (id, rendered) in &results {
        match rendered {
            Ok(html) => {
                let output_path = project.out_dir.join(card_file_name(data, id));
                if let Err(e) = save_html(html, &output_path) {
                    eprintln!("Error: Failed to save '{}': {}", output_path.display(), e);
                    failed += 1;
                    continue;
                }
                println!("Saved: {}", output_path.display());
            }
            Err(e) => {
                report_card_error(&registry, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        eprintln!("{} of {} template(s) failed", failed, results.len());
        return ExitCode::from(EXIT_ERROR);
    }
    ExitCode::from(EXIT_SUCCESS)
}

/// Execute the templates command
fn run_templates(config: Option<&Path>, overrides: &CliOverrides) -> ExitCode {
    let project = match project_or_exit(config, overrides) {
        Ok(project) => project,
        Err(code) => return code,
    };

    let registry = project.registry(DirectoryStore::new(&project.templates_dir));
    for id in registry.ids() {
        println!("{}", id);
    }

    ExitCode::from(EXIT_SUCCESS)
}
