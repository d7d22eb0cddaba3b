//! Command-line converter for a single note blob.
//!
//! # Responsibility
//! - Convert one blob file and print Markdown to stdout.
//! - Print anomalies and failures as JSON lines to stderr.
//!
//! Usage: `applenotes_cli <blob-file> [--mergeable] [--config <file.json>] [--attachments <dir>]
//! [--created <secs>] [--modified <secs>]`
//!
//! `--created` and `--modified` take raw Core Data timestamps (seconds since
//! 2001-01-01) as stored in the note row.

use applenotes_core::{
    convert_note, init_logging, AttachmentRef, AttachmentResolution, AttachmentResolver,
    BlobKind, ConvertContext, CoreConfig, ExtractedFile, NoteId, NoteInput, NoteMetadata,
    NullResolver,
};
use log::info;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

struct Args {
    blob_path: PathBuf,
    blob_kind: BlobKind,
    config_path: Option<PathBuf>,
    attachments_dir: Option<PathBuf>,
    created: Option<f64>,
    modified: Option<f64>,
}

/// Looks up attachment bytes under `<root>/<source_hint>`.
struct DirectoryResolver {
    root: PathBuf,
}

impl AttachmentResolver for DirectoryResolver {
    fn resolve_attachment(&self, reference: &AttachmentRef) -> AttachmentResolution {
        let Some(hint) = reference.source_hint.as_deref() else {
            return AttachmentResolution::NotFound;
        };
        let path = self.root.join(hint);
        match std::fs::read(&path) {
            Ok(bytes) => AttachmentResolution::File(ExtractedFile::new(file_name(&path), bytes)),
            Err(_) => AttachmentResolution::NotFound,
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn parse_args<I>(raw: I) -> Result<Args, String>
where
    I: IntoIterator<Item = String>,
{
    let mut blob_path = None;
    let mut blob_kind = BlobKind::NoteStore;
    let mut config_path = None;
    let mut attachments_dir = None;
    let mut created = None;
    let mut modified = None;

    let mut args = raw.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--mergeable" => blob_kind = BlobKind::MergeableData,
            "--config" => {
                config_path = Some(PathBuf::from(
                    args.next().ok_or("--config needs a file path")?,
                ));
            }
            "--attachments" => {
                attachments_dir = Some(PathBuf::from(
                    args.next().ok_or("--attachments needs a directory")?,
                ));
            }
            "--created" => created = Some(parse_seconds("--created", args.next())?),
            "--modified" => modified = Some(parse_seconds("--modified", args.next())?),
            other if other.starts_with("--") => return Err(format!("unknown flag `{other}`")),
            other => blob_path = Some(PathBuf::from(other)),
        }
    }

    Ok(Args {
        blob_path: blob_path.ok_or("missing <blob-file> argument")?,
        blob_kind,
        config_path,
        attachments_dir,
        created,
        modified,
    })
}

fn parse_seconds(flag: &str, value: Option<String>) -> Result<f64, String> {
    let value = value.ok_or_else(|| format!("{flag} needs a Core Data timestamp"))?;
    value
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite())
        .ok_or_else(|| format!("{flag} expects seconds, got `{value}`"))
}

fn load_config(path: Option<&Path>) -> Result<CoreConfig, String> {
    let Some(path) = path else {
        return Ok(CoreConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read config `{}`: {err}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|err| format!("invalid config `{}`: {err}", path.display()))
}

fn run() -> Result<(), String> {
    let args = parse_args(std::env::args().skip(1))?;
    let config = load_config(args.config_path.as_deref())?;
    init_logging(&config.logging)?;

    let blob = std::fs::read(&args.blob_path)
        .map_err(|err| format!("failed to read `{}`: {err}", args.blob_path.display()))?;
    let input = NoteInput {
        metadata: NoteMetadata::new(NoteId::nil())
            .with_core_data_times(args.created, args.modified),
        blob,
        blob_kind: args.blob_kind,
    };

    let directory = args
        .attachments_dir
        .map(|root| DirectoryResolver { root });
    let attachments: &dyn AttachmentResolver = match &directory {
        Some(resolver) => resolver,
        None => &NullResolver,
    };
    let context = ConvertContext::new(&config.convert, attachments, &NullResolver);

    info!(
        "event=cli_convert module=cli status=start version={} blob_bytes={} modified_at={:?}",
        applenotes_core::core_version(),
        input.blob.len(),
        input.metadata.modified_at
    );
    let note = convert_note(&input, context).map_err(|err| err.to_string())?;

    println!("{}", note.markdown);
    for anomaly in &note.anomalies {
        let line = serde_json::to_string(anomaly).map_err(|err| err.to_string())?;
        eprintln!("{line}");
    }
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", serde_json::json!({ "error": message }));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_args;
    use applenotes_core::{BlobKind, NoteId, NoteMetadata};

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn core_data_times_reach_metadata() {
        let parsed = parse_args(args(&["note.bin", "--modified", "1.5", "--mergeable"]))
            .expect("args");
        assert_eq!(parsed.blob_kind, BlobKind::MergeableData);
        let metadata =
            NoteMetadata::new(NoteId::nil()).with_core_data_times(parsed.created, parsed.modified);
        assert_eq!(metadata.created_at, None);
        assert_eq!(metadata.modified_at, Some(978_307_201_500));
    }

    #[test]
    fn rejects_non_numeric_timestamp() {
        let err = parse_args(args(&["note.bin", "--created", "yesterday"]))
            .err()
            .expect("must fail");
        assert!(err.contains("--created"));
    }

    #[test]
    fn blob_path_is_required() {
        assert!(parse_args(args(&["--mergeable"])).is_err());
    }
}
