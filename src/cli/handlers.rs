use crate::Config;
use crate::api;
use crate::cli::commands::{DocumentCommands, KeyCommands, SignatureCommands};
use crate::cli::{print_validation_warning, progress};
use crate::error::{Error, Result};
use crate::hash::SHORT_CHECKSUM_LEN;
use crate::signing::signer::DEFAULT_VISIBLE_TEXT;
use crate::signing::{
    SignatureRecord, SignedDocument, VerificationResult, generate_key_pair_with_algorithm,
    keys::{load_key_pair, save_key_pair},
};
use crate::utils::{read_file_to_string, write_file};
use std::path::{Path, PathBuf};

pub fn handle_document_command(cmd: DocumentCommands, config: &Config) -> Result<()> {
    match cmd {
        DocumentCommands::Pages { file } => {
            println!("{}", api::get_page_count(&file)?);
            Ok(())
        }
        DocumentCommands::Info { file } => {
            let info = api::get_pdf_info(&file)?;
            let mut digest = api::get_checksum(&file)?;
            digest.truncate(SHORT_CHECKSUM_LEN);
            println!("File:     {}", file.display());
            println!("Pages:    {}", info.page_count);
            println!("Version:  PDF-{}", info.version);
            println!("Size:     {} bytes", info.byte_length);
            println!("Checksum: {digest}");
            Ok(())
        }
        DocumentCommands::Checksum { file, short } => {
            let mut digest = api::get_checksum(&file)?;
            if short {
                digest.truncate(SHORT_CHECKSUM_LEN);
            }
            println!("{digest}");
            Ok(())
        }
        DocumentCommands::Watermark {
            input,
            text,
            output,
            appearance,
        } => {
            let output = output.unwrap_or_else(|| sibling_path(&input, "watermarked", "pdf"));
            let spec = appearance.to_spec(&text);

            let pb = progress::spinner("Applying watermark...", config.show_progress);
            let result = api::apply_annotation_to_file(&input, &output, &spec);
            pb.finish_and_clear();
            result?;

            println!("Watermarked {} -> {}", input.display(), output.display());
            Ok(())
        }
    }
}

pub fn handle_key_command(cmd: KeyCommands) -> Result<()> {
    match cmd {
        KeyCommands::Generate {
            output,
            algorithm,
            force,
        } => {
            if output.exists() && !force {
                return Err(Error::Validation(format!(
                    "{} already exists (use --force to overwrite)",
                    output.display()
                )));
            }
            let pair = generate_key_pair_with_algorithm(algorithm)?;
            save_key_pair(&pair, &output)?;

            println!("Generated {} key pair", pair.algorithm());
            println!("Fingerprint: {}", pair.fingerprint());
            println!("Saved to:    {}", output.display());
            println!("Keep this file private; share only the public_key value.");
            Ok(())
        }
        KeyCommands::Info { file } => {
            let blob = read_file_to_string(&file)?;
            let info = api::parse_key_info_json(&blob)?;
            println!("Fingerprint: {}", info.fingerprint);
            println!("Algorithm:   {}", info.algorithm);
            if let Some(created_at) = info.created_at {
                println!("Created:     {created_at}");
            }
            Ok(())
        }
    }
}

pub fn handle_signature_command(cmd: SignatureCommands, config: &Config) -> Result<()> {
    match cmd {
        SignatureCommands::Sign {
            input,
            key,
            output,
            record,
            text,
            appearance,
        } => {
            let key_path = resolve_key_path(key, config)?;
            let private_key = read_file_to_string(&key_path)?;
            let output = output.unwrap_or_else(|| sibling_path(&input, "signed", "pdf"));
            let record_path = record.unwrap_or_else(|| record_path_for(&output));
            let text = text
                .or_else(|| config.visible_text.clone())
                .unwrap_or_else(|| DEFAULT_VISIBLE_TEXT.to_string());

            if record_path.exists() {
                print_validation_warning(&format!(
                    "overwriting existing record {}",
                    record_path.display()
                ));
            }

            let pages = api::get_pdf_info_before_signing(&input)?;
            let spec = appearance.to_spec(&text);

            let pb = progress::spinner("Signing...", config.show_progress);
            let signed = api::sign_file(&input, &output, &private_key, Some(&text), Some(&spec));
            pb.finish_and_clear();
            let signed = signed?;

            write_file(&record_path, signed.as_bytes())?;
            let signed: SignedDocument = serde_json::from_str(&signed)?;

            println!("Signed {} ({pages} pages)", input.display());
            println!("Marked copy:  {}", output.display());
            println!("Record:       {}", record_path.display());
            println!("Algorithm:    {}", signed.signature_info.algorithm);
            println!("Content hash: {}", signed.signature_info.document_hash);
            if let Some(fp) = signed.signature_info.signer_fingerprint {
                println!("Signer:       {fp}");
            }
            Ok(())
        }
        SignatureCommands::Verify {
            input,
            record,
            key,
            json,
        } => {
            let key_path = resolve_key_path(key, config)?;
            let public_key = public_key_material(&key_path)?;
            let record_blob = read_file_to_string(&record)?;

            let pb = progress::spinner("Verifying...", config.show_progress);
            let result = api::verify_file(&input, &record_blob, &public_key);
            pb.finish_and_clear();
            let result = result?;

            if json {
                println!("{result}");
                return Ok(());
            }
            let result: VerificationResult = serde_json::from_str(&result)?;
            print_verification(&result);
            Ok(())
        }
    }
}

fn print_verification(result: &VerificationResult) {
    let record: &SignatureRecord = &result.signature_info;
    println!("{}", if result.is_valid { "VALID" } else { "INVALID" });
    println!("{}", result.message);
    println!("Signed at:   {}", record.timestamp);
    println!("Algorithm:   {}", record.algorithm);
    if let Some(fp) = &record.signer_fingerprint {
        println!("Signer:      {fp}");
    }
    println!("Verified at: {}", result.verified_at);
}

fn resolve_key_path(flag: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    flag.or_else(|| config.key_path.clone()).ok_or_else(|| {
        Error::Validation("no key given (use --key or set PDFSEAL_KEY)".to_string())
    })
}

/// Full key-pair files are validated before use; anything else is passed through.
fn public_key_material(path: &Path) -> Result<String> {
    let content = read_file_to_string(path)?;
    if content.trim_start().starts_with('{') && content.contains("\"private_key\"") {
        let pair = load_key_pair(path)?;
        return Ok(pair.public_key().to_string());
    }
    Ok(content)
}

/// `dir/report.pdf` with suffix `signed` becomes `dir/report-signed.pdf`.
fn sibling_path(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    input.with_file_name(format!("{stem}-{suffix}.{extension}"))
}

fn record_path_for(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".sig.json");
    PathBuf::from(name)
}
