use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use walkdir::WalkDir;

use rowgroup::logger::{log_error, set_log_file, set_log_prefix};
use rowgroup::writer::DEFAULT_ROW_GROUP_BYTES;
use rowgroup::{ReadOptions, WriterOptions, decode_path, encode_path, inspect_path};

const TABLE_EXTENSION: &str = "rgt";
const TEXT_EXTENSIONS: &[&str] = &["csv", "txt", "tsv"];
/// Never one of `TEXT_EXTENSIONS`; decoding must not replace an encode input.
const DECODED_EXTENSION: &str = "decoded.csv";

#[derive(Parser)]
#[command(
    name = "rowgroup",
    version,
    about = "Convert delimited text to row-group table files and back"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode delimited text files into table files.
    Encode(EncodeArgs),
    /// Decode table files back into delimited text.
    Decode(DecodeArgs),
    /// Print the footer summary of a table file.
    Inspect(InspectArgs),
}

#[derive(Args, Clone)]
struct BatchArgs {
    /// Input files, or directories searched recursively by extension.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory receiving outputs named after each input.
    #[arg(long, conflicts_with = "out")]
    out_dir: Option<PathBuf>,

    /// Explicit output path for a single input.
    #[arg(long, conflicts_with = "out_dir")]
    out: Option<PathBuf>,

    /// Field delimiter.
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Number of concurrent worker threads.
    #[arg(long)]
    jobs: Option<usize>,

    /// Abort the run at the first failed file.
    #[arg(long)]
    fail_fast: bool,

    /// Append warnings and errors to this file as well as stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Parser, Clone)]
struct EncodeArgs {
    #[command(flatten)]
    common: BatchArgs,

    /// Encoded bytes a batch may reach before a new batch starts.
    #[arg(long, default_value_t = DEFAULT_ROW_GROUP_BYTES)]
    row_group_bytes: u64,
}

#[derive(Parser, Clone)]
struct DecodeArgs {
    #[command(flatten)]
    common: BatchArgs,

    /// Decode only these zero-based batch indices (comma-separated).
    #[arg(long, value_delimiter = ',')]
    batches: Option<Vec<usize>>,
}

#[derive(Parser, Clone)]
struct InspectArgs {
    input: PathBuf,
    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
}

type AnyError = Box<dyn std::error::Error + Send + Sync>;

fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Encode(args) => run_encode(&args),
        Command::Decode(args) => run_decode(&args),
        Command::Inspect(args) => run_inspect(&args),
    }
}

fn run_encode(args: &EncodeArgs) -> Result<(), AnyError> {
    let options = WriterOptions::new()
        .with_row_group_bytes(args.row_group_bytes)
        .with_delimiter(args.common.delimiter);
    run_batch(&args.common, is_text_file, TABLE_EXTENSION, |input, output| {
        let summary = encode_path(input, output, &options)?;
        println!(
            "{} -> {} ({} rows, {} batches, {} -> {} bytes)",
            input.display(),
            output.display(),
            summary.rows,
            summary.batches,
            summary.source_bytes,
            summary.bytes_written
        );
        Ok(())
    })
}

fn run_decode(args: &DecodeArgs) -> Result<(), AnyError> {
    let options = ReadOptions::new()
        .with_delimiter(args.common.delimiter)
        .with_batches(args.batches.clone().unwrap_or_default());
    run_batch(&args.common, is_table_file, DECODED_EXTENSION, |input, output| {
        let rows = decode_path(input, output, &options)?;
        println!("{} -> {} ({rows} rows)", input.display(), output.display());
        Ok(())
    })
}

fn run_inspect(args: &InspectArgs) -> Result<(), AnyError> {
    let summary = inspect_path(&args.input)?;
    if args.json {
        serde_json::to_writer_pretty(std::io::stdout(), &summary)?;
        println!();
    } else {
        print!("{summary}");
    }
    Ok(())
}

fn run_batch<F>(
    args: &BatchArgs,
    accept: fn(&Path) -> bool,
    out_ext: &str,
    convert: F,
) -> Result<(), AnyError>
where
    F: Fn(&Path, &Path) -> Result<(), AnyError> + Sync,
{
    if let Some(jobs) = args.jobs {
        // The global pool can only be built once per process.
        let _ = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global();
    }
    if let Some(path) = &args.log_file {
        set_log_file(path)?;
    }
    if let Some(dir) = &args.out_dir {
        std::fs::create_dir_all(dir)?;
    }

    let files = discover_inputs(&args.inputs, accept);
    if files.is_empty() {
        return Err("no matching input files".into());
    }
    if args.out.is_some() && files.len() != 1 {
        return Err("--out requires a single input".into());
    }

    let tasks: Vec<(PathBuf, PathBuf)> = match &args.out {
        Some(out) => vec![(files[0].clone(), out.clone())],
        None => files
            .into_iter()
            .map(|input| {
                let output = output_path(&input, args.out_dir.as_deref(), out_ext);
                (input, output)
            })
            .collect(),
    };

    let process = |(input, output): (PathBuf, PathBuf)| -> Result<(), AnyError> {
        let _prefix = set_log_prefix(input.display().to_string());
        check_distinct(&input, &output)
            .and_then(|()| convert(&input, &output))
            .inspect_err(|err| log_error(&err.to_string()))
    };

    if args.fail_fast {
        tasks
            .into_par_iter()
            .map(process)
            .collect::<Result<Vec<_>, _>>()?;
    } else {
        let failures = tasks
            .into_par_iter()
            .map(process)
            .filter(Result::is_err)
            .count();
        if failures > 0 {
            return Err(format!("completed with {failures} failures").into());
        }
    }

    Ok(())
}

fn discover_inputs(inputs: &[PathBuf], accept: fn(&Path) -> bool) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input)
                .follow_links(false)
                .into_iter()
                .filter_map(Result::ok)
            {
                let path = entry.path();
                if path.is_file() && accept(path) {
                    files.push(path.to_path_buf());
                }
            }
        } else if input.is_file() {
            // Explicit files are taken regardless of extension.
            files.push(input.clone());
        }
    }
    files.sort();
    files.dedup();
    files
}

fn has_extension(path: &Path, wanted: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
}

fn is_text_file(path: &Path) -> bool {
    TEXT_EXTENSIONS.iter().any(|ext| has_extension(path, ext))
}

fn is_table_file(path: &Path) -> bool {
    has_extension(path, TABLE_EXTENSION)
}

fn output_path(input: &Path, out_dir: Option<&Path>, ext: &str) -> PathBuf {
    out_dir.map_or_else(
        || input.with_extension(ext),
        |dir| {
            let fname = input.file_name().unwrap_or_else(|| OsStr::new("output"));
            dir.join(PathBuf::from(fname).with_extension(ext))
        },
    )
}

fn check_distinct(input: &Path, output: &Path) -> Result<(), AnyError> {
    let same = match (input.canonicalize(), output.canonicalize()) {
        (Ok(input), Ok(output)) => input == output,
        _ => input == output,
    };
    if same {
        return Err(format!("refusing to overwrite input {}", input.display()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoded_output_does_not_replace_the_source_text() {
        let table = Path::new("data/people.rgt");
        assert_eq!(
            output_path(table, None, DECODED_EXTENSION),
            Path::new("data/people.decoded.csv")
        );
        assert_eq!(
            output_path(table, Some(Path::new("out")), DECODED_EXTENSION),
            Path::new("out/people.decoded.csv")
        );
        assert_eq!(
            output_path(Path::new("data/people.csv"), None, TABLE_EXTENSION),
            Path::new("data/people.rgt")
        );
    }

    #[test]
    fn output_equal_to_input_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("people.csv");
        std::fs::write(&input, "a,1").unwrap();
        assert!(check_distinct(&input, &input).is_err());
        assert!(check_distinct(&input, &dir.path().join("people.rgt")).is_ok());
        assert_eq!(std::fs::read_to_string(&input).unwrap(), "a,1");
    }
}
