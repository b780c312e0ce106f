//! MK-90 volume image tool.
//!
//! Usage:
//!   mk90 create disk.bin --clusters 40
//!   mk90 ls disk.bin [--json]
//!   mk90 push disk.bin hello.bas
//!   mk90 cat disk.bin HELLO.BAS
//!   mk90 extract disk.bin --all --out dumped/
//!   mk90 delete disk.bin HELLO.BAS && mk90 squeeze disk.bin

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use mk90_core::{Volume, VolumeParams};

/// Inspect and edit Elektronika MK-90 volume images.
#[derive(Parser, Debug)]
#[command(name = "mk90")]
#[command(about = "Inspect and edit Elektronika MK-90 volume images")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a fresh volume image
    Create {
        image: PathBuf,
        /// Total size in clusters (max 127)
        #[arg(long)]
        clusters: u16,
        /// Number of directory segments (1 or 2)
        #[arg(long, default_value_t = 1)]
        dir_segs: u16,
        /// Clusters per directory segment (1 or 2)
        #[arg(long, default_value_t = 2)]
        seg_clusters: u16,
        /// Use the BASIC v2.0 layout (extra word per entry)
        #[arg(long)]
        v2: bool,
    },
    /// List directory entries
    Ls {
        image: PathBuf,
        /// Emit the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a file as text to stdout
    Cat { image: PathBuf, file: String },
    /// Extract files to the host filesystem
    Extract {
        image: PathBuf,
        files: Vec<String>,
        /// Extract payloads as-is instead of decoding text
        #[arg(long)]
        raw: bool,
        /// Extract every file on the volume
        #[arg(long)]
        all: bool,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Add host files to the volume
    Push {
        image: PathBuf,
        files: Vec<PathBuf>,
        /// Store payloads as-is instead of re-encoding text
        #[arg(long)]
        raw: bool,
    },
    /// Rename a file
    Rename {
        image: PathBuf,
        old: String,
        new: String,
    },
    /// Delete files
    Delete { image: PathBuf, files: Vec<String> },
    /// Consolidate free space at the end of the volume
    Squeeze { image: PathBuf },
    /// Allocate more clusters
    Grow { image: PathBuf, n: u16 },
    /// Trim free clusters
    Trim { image: PathBuf, n: u16 },
}

fn load(image: &Path) -> Result<Volume, Box<dyn std::error::Error>> {
    Ok(Volume::read(&fs::read(image)?)?)
}

fn save(image: &Path, vol: &Volume) -> Result<(), Box<dyn std::error::Error>> {
    fs::write(image, vol.to_bytes())?;
    Ok(())
}

fn print_listing(vol: &Volume) {
    let snap = vol.snapshot();
    println!("{:<12} {:>8}  {}", "NAME", "CLUSTERS", "STATUS");
    for entry in &snap.entries {
        let name = if entry.status == "file" {
            entry.filename.clone()
        } else {
            "-".to_string()
        };
        println!("{:<12} {:>8}  {}", name, entry.n_clusters, entry.status);
    }
    println!(
        "{} free cluster(s), {}/{} directory entries",
        snap.n_free_clusters,
        snap.entries.len(),
        snap.n_max_entries
    );
}

/// Host-side name for an extracted file.
fn host_name(volume_name: &str) -> String {
    volume_name.to_lowercase()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match args.command {
        Command::Create {
            image,
            clusters,
            dir_segs,
            seg_clusters,
            v2,
        } => {
            let params = if v2 {
                VolumeParams::v2(clusters, dir_segs, seg_clusters)?
            } else {
                VolumeParams::v1(clusters, dir_segs, seg_clusters)?
            };
            let vol = Volume::create(params);
            save(&image, &vol)?;
            eprintln!(
                "Created {} ({} clusters, {} free)",
                image.display(),
                clusters,
                vol.snapshot().n_free_clusters
            );
        }

        Command::Ls { image, json } => {
            let vol = load(&image)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&vol.snapshot())?);
            } else {
                print_listing(&vol);
            }
        }

        Command::Cat { image, file } => {
            let vol = load(&image)?;
            for line in vol.extract_text(&file)? {
                println!("{}", line);
            }
        }

        Command::Extract {
            image,
            files,
            raw,
            all,
            out,
        } => {
            let vol = load(&image)?;
            fs::create_dir_all(&out)?;

            let names: Vec<String> = if all {
                vol.extract_raw_all()
                    .into_iter()
                    .map(|f| f.filename)
                    .collect()
            } else {
                files
            };

            for name in names {
                let path = out.join(host_name(&name));
                if raw {
                    fs::write(&path, vol.extract_raw(&name)?)?;
                } else {
                    let mut text = vol.extract_text(&name)?.join("\n");
                    text.push('\n');
                    fs::write(&path, text)?;
                }
                eprintln!("Extracted {} -> {}", name, path.display());
            }
        }

        Command::Push { image, files, raw } => {
            let mut vol = load(&image)?;
            for path in &files {
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .ok_or_else(|| format!("bad file name: {}", path.display()))?;

                if raw {
                    vol.push_raw(name, fs::read(path)?)?;
                } else {
                    let lines: Vec<String> = fs::read_to_string(path)?
                        .lines()
                        .map(str::to_string)
                        .collect();
                    vol.push_text(name, &lines)?;
                }
                eprintln!("Pushed {}", name);
            }
            save(&image, &vol)?;
        }

        Command::Rename { image, old, new } => {
            let mut vol = load(&image)?;
            vol.rename(&old, &new)?;
            save(&image, &vol)?;
            eprintln!("Renamed {} -> {}", old, new);
        }

        Command::Delete { image, files } => {
            let mut vol = load(&image)?;
            for name in &files {
                vol.delete(name)?;
                eprintln!("Deleted {}", name);
            }
            save(&image, &vol)?;
        }

        Command::Squeeze { image } => {
            let mut vol = load(&image)?;
            let free = vol.squeeze();
            save(&image, &vol)?;
            eprintln!("{} free cluster(s) consolidated at the volume end", free);
        }

        Command::Grow { image, n } => {
            let mut vol = load(&image)?;
            vol.grow(n)?;
            save(&image, &vol)?;
            eprintln!(
                "Volume grown to {} clusters",
                vol.params().n_clusters_allocated()
            );
        }

        Command::Trim { image, n } => {
            let mut vol = load(&image)?;
            vol.trim(n)?;
            save(&image, &vol)?;
            eprintln!(
                "Volume trimmed to {} clusters",
                vol.params().n_clusters_allocated()
            );
        }
    }

    Ok(())
}
