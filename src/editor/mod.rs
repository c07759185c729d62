//! External image editor hand-off.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use thiserror::Error;

const SWAPPY: &str = "swappy";

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("editor command is empty")]
    EmptyCommand,
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

pub type EditorResult<T> = std::result::Result<T, EditorError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorInvocation {
    pub program: String,
    pub args: Vec<OsString>,
}

/// Builds the command line for `editor`. Extra words in the setting are
/// passed through as leading arguments; `swappy` takes the file via `-f`.
pub fn editor_invocation(editor: &str, path: &Path) -> EditorResult<EditorInvocation> {
    let mut words = editor.split_whitespace();
    let program = words.next().ok_or(EditorError::EmptyCommand)?.to_string();
    let mut args: Vec<OsString> = words.map(OsString::from).collect();

    if is_swappy(&program) {
        args.push(OsString::from("-f"));
    }
    args.push(path.as_os_str().to_os_string());

    Ok(EditorInvocation { program, args })
}

fn is_swappy(program: &str) -> bool {
    Path::new(program)
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name == SWAPPY)
}

pub trait EditorLauncher {
    /// Starts the editor without waiting for it to exit.
    fn launch(&self, editor: &str, path: &Path) -> EditorResult<()>;
}

#[derive(Debug, Default)]
pub struct SpawnEditorLauncher;

impl EditorLauncher for SpawnEditorLauncher {
    fn launch(&self, editor: &str, path: &Path) -> EditorResult<()> {
        let invocation = editor_invocation(editor, path)?;
        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| EditorError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        tracing::info!(program = %invocation.program, path = %path.display(), "editor launched");
        let program = invocation.program;
        std::thread::spawn(move || match child.wait() {
            Ok(status) if !status.success() => {
                tracing::warn!(program = %program, %status, "editor exited with failure status");
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(program = %program, ?err, "failed to wait for editor"),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swappy_receives_file_flag() {
        let invocation = editor_invocation("swappy", Path::new("/tmp/shot.png")).unwrap();
        assert_eq!(invocation.program, "swappy");
        assert_eq!(
            invocation.args,
            vec![OsString::from("-f"), OsString::from("/tmp/shot.png")]
        );
    }

    #[test]
    fn swappy_is_detected_by_file_name_and_trimmed() {
        let invocation =
            editor_invocation("  /usr/bin/swappy ", Path::new("/tmp/shot.png")).unwrap();
        assert_eq!(invocation.program, "/usr/bin/swappy");
        assert_eq!(invocation.args[0], OsString::from("-f"));
    }

    #[test]
    fn other_editors_receive_bare_path_after_extra_words() {
        let invocation = editor_invocation("gimp --new-instance", Path::new("/tmp/a b.png")).unwrap();
        assert_eq!(invocation.program, "gimp");
        assert_eq!(
            invocation.args,
            vec![
                OsString::from("--new-instance"),
                OsString::from("/tmp/a b.png"),
            ]
        );
    }

    #[test]
    fn blank_editor_is_rejected() {
        assert!(matches!(
            editor_invocation("   ", Path::new("/tmp/shot.png")),
            Err(EditorError::EmptyCommand)
        ));
    }

    #[test]
    fn launch_reports_spawn_failure() {
        let err = SpawnEditorLauncher
            .launch("hyprsnipper-no-such-editor", Path::new("/tmp/shot.png"))
            .expect_err("missing program must fail");
        assert!(matches!(err, EditorError::Spawn { .. }));
    }
}
