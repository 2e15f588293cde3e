//! drivepath CLI - Work with Google Drive files by path.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;

use drivepath::logging::init_logging;
use drivepath::{
    Authenticator, Drive, DriveClient, DriveConfig, DrivePath, MetadataUpdate, PathOptions,
    PermissionGrant, PermissionRole, PermissionType,
};

/// CLI tool for working with Google Drive files by path.
#[derive(Parser)]
#[command(name = "drivepath")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to service account JSON credentials file.
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// OAuth2 access token to use instead of a service account.
    #[arg(long, env = "DRIVE_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Also match files that are in the trash.
    #[arg(long)]
    include_trashed: bool,

    /// Log every API call.
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the files a path names.
    Ls {
        /// Path such as "Reports/2024/summary.csv".
        path: String,
    },

    /// Create a path, reusing any folders and file that already exist.
    Mkpath {
        path: String,

        /// Upload this local file as the content of the leaf.
        #[arg(long)]
        content_file: Option<PathBuf>,

        /// MIME type for the leaf (guessed from its name by default).
        #[arg(long)]
        mime_type: Option<String>,

        /// Share every created entity, e.g. "ann@example.com:writer".
        #[arg(long = "share", value_name = "EMAIL[:ROLE]")]
        shares: Vec<String>,
    },

    /// Upload local files into a folder path.
    Put {
        /// File patterns to upload (supports glob patterns like *.csv, file_{1,2}.txt).
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Destination folder path.
        #[arg(long, short = 't')]
        to: String,
    },

    /// Download the first file a path names.
    Get {
        path: String,

        /// Export format (defaults by document type).
        #[arg(long)]
        mime_type: Option<String>,

        /// Write here instead of stdout.
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },

    /// Share every file a path names.
    Share {
        path: String,

        #[arg(long)]
        email: String,

        #[arg(long, default_value = "reader")]
        role: PermissionRole,

        #[arg(long = "type", default_value = "user")]
        permission_type: PermissionType,

        /// Send a notification email.
        #[arg(long)]
        notify: bool,

        /// Message for the notification email.
        #[arg(long, requires = "notify")]
        message: Option<String>,
    },

    /// Delete every file a path names.
    Rm { path: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let auth = match (&cli.token, &cli.credentials) {
        (Some(token), _) => Authenticator::from_access_token(token.clone())?,
        (None, Some(path)) => Authenticator::from_file(path)
            .with_context(|| format!("Failed to load credentials from {:?}", path))?,
        (None, None) => bail!("Either --credentials or --token is required"),
    };

    let config = DriveConfig {
        skip_trashed: !cli.include_trashed,
        ..DriveConfig::default()
    };
    let drive = Drive::new(DriveClient::with_config(auth, config)?);

    match cli.command {
        Commands::Ls { path } => {
            let files = drive
                .get_from_path(&path)
                .await
                .with_context(|| format!("Failed to resolve {}", path))?;

            if files.is_empty() {
                println!("No files found.");
            } else {
                println!("ID\tSIZE\tTYPE\tNAME");
                for file in files {
                    println!("{}", file.metadata());
                }
            }
        }

        Commands::Mkpath {
            path,
            content_file,
            mime_type,
            shares,
        } => {
            let mut options = PathOptions {
                mime_type,
                ..PathOptions::default()
            };
            if let Some(file) = content_file {
                let bytes = std::fs::read(&file)
                    .with_context(|| format!("Failed to read {:?}", file))?;
                options = options.with_content(bytes);
            }
            for share in &shares {
                options = options.with_permission(parse_share(share)?);
            }

            let chain = drive
                .create_from_path(&path, options)
                .await
                .with_context(|| format!("Failed to create {}", path))?;

            for entry in chain {
                println!("{}", entry.metadata());
            }
        }

        Commands::Put { patterns, to } => {
            let folder = DrivePath::parse(&to)
                .with_context(|| format!("Invalid folder path: {}", to))?;
            let files_to_upload = expand_patterns(&patterns)?;

            if files_to_upload.is_empty() {
                bail!("No files to upload");
            }

            println!("Uploading {} file(s) to {}...", files_to_upload.len(), folder);

            for (idx, file_path) in files_to_upload.iter().enumerate() {
                let filename = file_path.file_name().unwrap_or_default().to_string_lossy();
                print!("[{}/{}] {}... ", idx + 1, files_to_upload.len(), filename);

                match upload(&drive, &folder, file_path, &filename).await {
                    Ok(outcome) => println!("{}", outcome),
                    Err(e) => {
                        println!("FAILED");
                        eprintln!("  Error: {:#}", e);
                    }
                }
            }

            println!("Done.");
        }

        Commands::Get {
            path,
            mime_type,
            out,
        } => {
            let mut files = drive
                .get_from_path(&path)
                .await
                .with_context(|| format!("Failed to resolve {}", path))?;
            if files.is_empty() {
                bail!("No file at {}", path);
            }

            let file = &mut files[0];
            let bytes = file
                .download(mime_type.as_deref())
                .await
                .with_context(|| format!("Failed to download {}", path))?;

            match out {
                Some(out) => {
                    std::fs::write(&out, bytes)
                        .with_context(|| format!("Failed to write {:?}", out))?;
                    eprintln!("Saved to: {:?}", out);
                }
                None => std::io::stdout().write_all(bytes)?,
            }
        }

        Commands::Share {
            path,
            email,
            role,
            permission_type,
            notify,
            message,
        } => {
            let mut grant = PermissionGrant::new(email)
                .role(role)
                .permission_type(permission_type);
            if notify {
                grant = grant.notify(message);
            }

            let mut files = drive
                .get_from_path(&path)
                .await
                .with_context(|| format!("Failed to resolve {}", path))?;
            if files.is_empty() {
                bail!("No file at {}", path);
            }

            for file in files.iter_mut() {
                let permission = file.give_permission(&grant).await?;
                println!(
                    "{}\t{}",
                    file.id(),
                    permission.id.as_deref().unwrap_or("-")
                );
            }
        }

        Commands::Rm { path } => {
            let deleted = drive
                .delete_path(&path)
                .await
                .with_context(|| format!("Failed to delete {}", path))?;
            println!("Deleted {} file(s).", deleted);
        }
    }

    Ok(())
}

/// Upload one local file into `folder`, replacing the content of a file of
/// the same name if one is already there.
async fn upload(
    drive: &Drive,
    folder: &DrivePath,
    local: &Path,
    filename: &str,
) -> Result<&'static str> {
    let remote = folder.join(filename)?;
    let bytes = std::fs::read(local).with_context(|| format!("Failed to read {:?}", local))?;

    let mut chain = drive
        .create_from_path(
            &remote.to_string(),
            PathOptions::default().with_content(bytes.clone()),
        )
        .await?;

    let Some(mut leaf) = chain.pop() else {
        bail!("Nothing created for {}", remote);
    };

    // A handle without cached content was found rather than created.
    if leaf.content().is_none() {
        leaf.update(&MetadataUpdate::default(), Some(bytes)).await?;
        return Ok("updated");
    }

    Ok("created")
}

/// Parse "email" or "email:role".
fn parse_share(value: &str) -> Result<PermissionGrant> {
    if let Some((email, role)) = value.rsplit_once(':') {
        if let Ok(role) = role.parse::<PermissionRole>() {
            return Ok(PermissionGrant::new(email).role(role));
        }
    }
    Ok(PermissionGrant::new(value))
}

/// Expand brace and glob patterns into existing local files, deduplicated.
fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for pattern in patterns {
        for expanded in expand_braces(pattern) {
            let matches: Vec<PathBuf> = glob(&expanded)
                .with_context(|| format!("Invalid glob pattern: {}", expanded))?
                .filter_map(|r| r.ok())
                .filter(|p| p.is_file())
                .collect();

            if matches.is_empty() {
                eprintln!("Warning: No files matched pattern: {}", expanded);
            }
            files.extend(matches);
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Expand `{a,b}` alternatives, e.g. `file_{1,2}.txt` into two patterns.
fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(start) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };
    let Some(len) = pattern[start..].find('}') else {
        return vec![pattern.to_string()];
    };

    let end = start + len;
    let (prefix, suffix) = (&pattern[..start], &pattern[end + 1..]);

    pattern[start + 1..end]
        .split(',')
        .flat_map(|alt| expand_braces(&format!("{}{}{}", prefix, alt.trim(), suffix)))
        .collect()
}
