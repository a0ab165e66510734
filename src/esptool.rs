use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_PROGRAM: &str = "esptool.py";
pub const DEFAULT_CHIP: &str = "esp32";

/// How to launch the flashing tool, e.g. `esptool.py` or `python -m esptool`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EsptoolCommand {
    pub program: PathBuf,
    pub prefix_args: Vec<String>,
}

impl Default for EsptoolCommand {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            prefix_args: Vec::new(),
        }
    }
}

/// Where the tool's stdout goes. stderr is always inherited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStdout {
    Inherit,
    /// Keeps our stdout reserved for JSON lines.
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FlashAction {
    WriteFlash { offset: String, image: PathBuf },
    ReadFlash { offset: String, size: u64, image: PathBuf },
}

impl FlashAction {
    pub fn name(&self) -> &'static str {
        match self {
            FlashAction::WriteFlash { .. } => "write_flash",
            FlashAction::ReadFlash { .. } => "read_flash",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EsptoolInvocation {
    pub chip: String,
    pub port: String,
    pub baud: String,
    pub action: FlashAction,
}

impl EsptoolInvocation {
    /// Positional arguments after the program and its prefix args.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-c".into(),
            self.chip.clone().into(),
            "-p".into(),
            self.port.clone().into(),
            "-b".into(),
            self.baud.clone().into(),
            self.action.name().into(),
        ];
        match &self.action {
            FlashAction::WriteFlash { offset, image } => {
                args.push(offset.clone().into());
                args.push(image.clone().into_os_string());
            }
            FlashAction::ReadFlash {
                offset,
                size,
                image,
            } => {
                args.push(offset.clone().into());
                args.push(size.to_string().into());
                args.push(image.clone().into_os_string());
            }
        }
        args
    }

    /// Shell-like rendering for logs and dry runs.
    pub fn command_line(&self, tool: &EsptoolCommand) -> String {
        let mut parts: Vec<String> = vec![tool.program.to_string_lossy().to_string()];
        parts.extend(tool.prefix_args.iter().cloned());
        parts.extend(self.args().iter().map(|a| a.to_string_lossy().to_string()));
        parts
            .into_iter()
            .map(|p| {
                if p.is_empty() || p.contains(char::is_whitespace) {
                    format!("\"{p}\"")
                } else {
                    p
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Error, Debug)]
pub enum EsptoolError {
    #[error("unable to run {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{program:?} was terminated without an exit code")]
    Terminated { program: PathBuf },
}

/// Run the tool to completion and return its exit code unchanged.
pub fn run(
    tool: &EsptoolCommand,
    invocation: &EsptoolInvocation,
    stdout: ToolStdout,
) -> Result<i32, EsptoolError> {
    let mut cmd = Command::new(&tool.program);
    cmd.args(&tool.prefix_args)
        .args(invocation.args())
        .stdin(Stdio::null())
        .stderr(Stdio::inherit());
    match stdout {
        ToolStdout::Inherit => {
            cmd.stdout(Stdio::inherit());
        }
        ToolStdout::Stderr => {
            cmd.stdout(Stdio::from(std::io::stderr()));
        }
    }

    tracing::info!(cmd = %invocation.command_line(tool), "running flashing tool");

    let status = cmd.status().map_err(|e| EsptoolError::Spawn {
        program: tool.program.clone(),
        source: e,
    })?;

    let code = status.code().ok_or_else(|| EsptoolError::Terminated {
        program: tool.program.clone(),
    })?;
    tracing::info!(code, "flashing tool exited");
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_write_flash_args() {
        let inv = EsptoolInvocation {
            chip: "esp32".to_string(),
            port: "/dev/ttyUSB0".to_string(),
            baud: "921600".to_string(),
            action: FlashAction::WriteFlash {
                offset: "0x110000".to_string(),
                image: PathBuf::from("build/fs_0.bin"),
            },
        };
        assert_eq!(
            strings(inv.args()),
            [
                "-c",
                "esp32",
                "-p",
                "/dev/ttyUSB0",
                "-b",
                "921600",
                "write_flash",
                "0x110000",
                "build/fs_0.bin"
            ]
        );
    }

    #[test]
    fn test_read_flash_args_and_command_line() {
        let inv = EsptoolInvocation {
            chip: "esp32".to_string(),
            port: "COM6".to_string(),
            baud: "460800".to_string(),
            action: FlashAction::ReadFlash {
                offset: "0x110000".to_string(),
                size: 491_520,
                image: PathBuf::from("build/fs r.bin"),
            },
        };
        assert_eq!(
            strings(inv.args())[6..],
            ["read_flash", "0x110000", "491520", "build/fs r.bin"]
        );

        let tool = EsptoolCommand {
            program: PathBuf::from("python"),
            prefix_args: vec!["-m".to_string(), "esptool".to_string()],
        };
        assert_eq!(
            inv.command_line(&tool),
            "python -m esptool -c esp32 -p COM6 -b 460800 read_flash 0x110000 491520 \"build/fs r.bin\""
        );
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let tool = EsptoolCommand {
            program: PathBuf::from("definitely-not-an-installed-esptool-binary"),
            prefix_args: Vec::new(),
        };
        let inv = EsptoolInvocation {
            chip: DEFAULT_CHIP.to_string(),
            port: "COM1".to_string(),
            baud: "115200".to_string(),
            action: FlashAction::WriteFlash {
                offset: "0x1000".to_string(),
                image: PathBuf::from("fs.bin"),
            },
        };
        let err = run(&tool, &inv, ToolStdout::Stderr).unwrap_err();
        assert!(matches!(err, EsptoolError::Spawn { .. }));
    }
}
