//! Shared logic for check and rewrite commands.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use ctxesc_lib::{Autoescaper, AutoescaperConfig, SourceMap};

/// Reads every file into one source map, `-` meaning stdin.
pub fn load_sources(files: &[PathBuf]) -> Result<SourceMap, String> {
    let mut map = SourceMap::new();
    let mut read_stdin = false;
    for path in files {
        if path.as_os_str() == "-" {
            if read_stdin {
                return Err("stdin can only be read once".to_owned());
            }
            read_stdin = true;
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("failed to read stdin: {e}"))?;
            map.add_stdin(&buf);
            continue;
        }
        let content = read_file(path)?;
        map.add_file(&path.to_string_lossy(), &content);
    }
    log::debug!(target: "ctxesc::cli", "loaded {} sources", map.len());
    Ok(map)
}

fn read_file(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("failed to read '{}': {e}", path.display()))
}

/// Like [`load_sources`], exiting with status 1 on failure.
pub fn load_sources_or_exit(files: &[PathBuf]) -> SourceMap {
    load_sources(files).unwrap_or_else(|msg| {
        eprintln!("error: {msg}");
        std::process::exit(1);
    })
}

/// The pass as configured by `--cancelling-directive` and `--fuel`.
pub fn build_autoescaper(cancelling_directives: &[String], fuel: Option<u32>) -> Autoescaper {
    let mut config = AutoescaperConfig::new().with_cancelling_directives(cancelling_directives);
    if let Some(fuel) = fuel {
        config = config.with_recontextualization_fuel(fuel);
    }
    Autoescaper::new(config)
}
