use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
    time::Instant,
};

use ccil::{
    compile_translation_unit,
    compiler::{assembly::AssemblyContext, options::AssemblyOptions},
    errors::errors::{Error, ErrorTip},
    get_line_at_position,
    target::metadata::{Assembly, AssemblyKind, TargetFramework},
};
use clap::Parser;
use serde::Serialize;

/// Compiles C source files into a listing for a stack-based managed VM.
#[derive(Parser, Debug)]
#[command(name = "ccil", version)]
struct Args {
    /// Source files, compiled in order into one artifact
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output listing path
    #[arg(short, long)]
    output: PathBuf,

    /// Produce a library instead of an executable
    #[arg(long)]
    library: bool,

    #[arg(long)]
    namespace: Option<String>,

    /// Type holding globals and functions; defaults to the module type
    #[arg(long = "global-type")]
    global_type: Option<String>,

    /// Target framework name, e.g. Microsoft.NETCore.App
    #[arg(long, requires = "framework_version")]
    framework: Option<String>,

    #[arg(long = "framework-version", requires = "framework")]
    framework_version: Option<String>,

    /// Referenced library, may be repeated
    #[arg(long = "reference")]
    references: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn assembly_options(&self) -> AssemblyOptions {
        let name = self
            .output
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("out"));
        let kind = if self.library {
            AssemblyKind::Library
        } else {
            AssemblyKind::Executable
        };

        let mut options = AssemblyOptions::new(&name, kind);
        options.namespace = self.namespace.clone();
        options.global_type_name = self.global_type.clone();
        options.references = self.references.clone();
        options.target_framework = match (&self.framework, &self.framework_version) {
            (Some(name), Some(version)) => Some(TargetFramework {
                name: name.clone(),
                version: version.clone(),
            }),
            _ => None,
        };
        options
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeConfig<'a> {
    runtime_options: RuntimeOptions<'a>,
}

#[derive(Serialize)]
struct RuntimeOptions<'a> {
    framework: &'a TargetFramework,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let start = Instant::now();
    let mut context = AssemblyContext::create(&args.assembly_options());

    for input in &args.inputs {
        let file_name = input.to_string_lossy().into_owned();
        let source = fs::read_to_string(input)
            .map_err(|error| format!("{}: error: cannot read file: {}", file_name, error))?;

        if let Err(error) = compile_translation_unit(&mut context, &source, &file_name) {
            display_error(&error, &file_name, &source);
            return Err(format!("{}: error: {}", file_name, error));
        }
        log::debug!("Compiled {} in {:?}", file_name, start.elapsed());
    }

    let output_name = args.output.to_string_lossy().into_owned();
    let assembly = context
        .verify_and_get_assembly()
        .map_err(|error| format!("{}: error: {}", output_name, error))?;

    fs::write(&args.output, assembly.to_string())
        .map_err(|error| format!("{}: error: cannot write listing: {}", output_name, error))?;

    write_runtime_config(&assembly, &args.output)?;

    log::info!("Wrote {} in {:?}", output_name, start.elapsed());
    Ok(())
}

/// Writes `<stem>.runtimeconfig.json` next to the listing for executables
/// that name a framework.
fn write_runtime_config(assembly: &Assembly, output: &Path) -> Result<(), String> {
    let framework = match (&assembly.target_framework, assembly.kind) {
        (Some(framework), AssemblyKind::Executable) => framework,
        _ => return Ok(()),
    };

    let config = RuntimeConfig {
        runtime_options: RuntimeOptions { framework },
    };
    let json = serde_json::to_string_pretty(&config)
        .map_err(|error| format!("error: cannot serialize runtime config: {}", error))?;

    let path = output.with_extension("runtimeconfig.json");
    fs::write(&path, json)
        .map_err(|error| format!("{}: error: cannot write runtime config: {}", path.display(), error))?;

    log::debug!("Wrote {}", path.display());
    Ok(())
}

fn display_error(error: &Error, file_name: &str, source: &str) {
    /*
        Error: UnexpectedToken (Unexpected token: `}`, did you miss a semicolon?)
        -> main.c
           |
        20 | int a = 1
           | ---------^
    */

    let position = error.get_position();
    let (line, line_text, line_pos) = match get_line_at_position(source, position.0) {
        Some(location) => location,
        None => return,
    };

    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    if let ErrorTip::None = error.get_tip() {
        eprintln!("Error: {}", error.get_error_name());
    } else {
        eprintln!("Error: {} ({})", error.get_error_name(), error.get_tip());
    }
    eprintln!("-> {}", file_name);
    eprintln!("{:>padding$}", "|");

    let trimmed = line_text.trim_start_matches(' ');
    let removed_whitespace = line_text.len() - trimmed.len();
    eprintln!("{} | {}", line_string, trimmed.trim_end());

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;
    eprintln!("{:>padding$} {:->arrows$}", "|", "^");
}
