//! Process Task Executor - 外部命令执行器
//!
//! 生成任务逐章节调用配置的外部命令 `{command} {book} {chapter}`，
//! stdout/stderr 追加进任务日志；删除任务直接移除章节的生成产物。
//!
//! 执行期间调用方持有作用域锁，同一章节不会被并发写。

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use crate::application::ports::{ExecutorError, Task, TaskExecutorPort, TaskKind};
use crate::config::TaskSettings;
use crate::domain::catalog::{AUDIO_CANDIDATES, CHAPTER_SIDECAR_FILE, SCRIPT_FILE, SUBTITLE_FILE};

/// 外部命令执行器
pub struct ProcessTaskExecutor {
    data_root: PathBuf,
    settings: TaskSettings,
}

impl ProcessTaskExecutor {
    pub fn new(data_root: PathBuf, settings: TaskSettings) -> Self {
        Self {
            data_root,
            settings,
        }
    }

    fn command_for(&self, kind: TaskKind) -> Result<&str, ExecutorError> {
        let command = match kind {
            TaskKind::GenerateScript => self.settings.script_command.as_str(),
            TaskKind::GenerateAudio => self.settings.audio_command.as_str(),
            TaskKind::GenerateSubtitles => self.settings.subtitle_command.as_str(),
            TaskKind::Delete => return Err(ExecutorError::NotConfigured("delete")),
        };
        if command.is_empty() {
            return Err(ExecutorError::NotConfigured(kind.as_str()));
        }
        Ok(command)
    }

    async fn run_command(
        &self,
        command: &str,
        book_id: &str,
        chapter_id: &str,
        log_path: &Path,
    ) -> Result<(), ExecutorError> {
        let mut parts = command.split_whitespace();
        let program = parts.next().ok_or(ExecutorError::NotConfigured("command"))?;

        let log = open_log(log_path).await?;
        append_line(
            log_path,
            &format!("[{}] $ {} {} {}", Utc::now().to_rfc3339(), command, book_id, chapter_id),
        )
        .await?;

        let stdout = log.try_clone()?;
        let stderr = log.try_clone()?;
        let status = tokio::process::Command::new(program)
            .args(parts)
            .arg(book_id)
            .arg(chapter_id)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .status()
            .await
            .map_err(|e| ExecutorError::SpawnFailed {
                command: command.to_string(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            let exit_code = status.code().unwrap_or(-1);
            append_line(
                log_path,
                &format!("[{}] exited with code {}", Utc::now().to_rfc3339(), exit_code),
            )
            .await?;
            return Err(ExecutorError::CommandFailed {
                command: command.to_string(),
                exit_code,
            });
        }
        Ok(())
    }

    /// 删除章节的生成产物与 sidecar，目录本身保留
    async fn delete_chapter(
        &self,
        book_id: &str,
        chapter_id: &str,
        log_path: &Path,
    ) -> Result<usize, ExecutorError> {
        let chapter_root = self.data_root.join(book_id).join(chapter_id);
        let mut targets = vec![SCRIPT_FILE.to_string(), SUBTITLE_FILE.to_string()];
        targets.push(CHAPTER_SIDECAR_FILE.to_string());
        for (name, _) in AUDIO_CANDIDATES {
            targets.push((*name).to_string());
        }

        let mut removed = 0usize;
        for name in targets {
            let path = chapter_root.join(&name);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    removed += 1;
                    append_line(
                        log_path,
                        &format!("[{}] removed {}/{}/{}", Utc::now().to_rfc3339(), book_id, chapter_id, name),
                    )
                    .await?;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(ExecutorError::Io(e)),
            }
        }
        debug!(book = %book_id, chapter = %chapter_id, removed, "Chapter artifacts deleted");
        Ok(removed)
    }
}

async fn open_log(path: &Path) -> Result<std::fs::File, ExecutorError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    Ok(file)
}

async fn append_line(path: &Path, line: &str) -> Result<(), ExecutorError> {
    use tokio::io::AsyncWriteExt;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(format!("{}\n", line).as_bytes()).await?;
    Ok(())
}

#[async_trait]
impl TaskExecutorPort for ProcessTaskExecutor {
    async fn execute(&self, task: &Task) -> Result<serde_json::Value, ExecutorError> {
        match task.kind {
            TaskKind::Delete => {
                let mut removed = 0usize;
                for chapter_id in &task.scope.chapter_ids {
                    removed += self
                        .delete_chapter(&task.scope.book_id, chapter_id, &task.log_path)
                        .await?;
                }
                info!(
                    task_id = %task.id,
                    book = %task.scope.book_id,
                    removed,
                    "Delete task complete"
                );
                Ok(serde_json::json!({
                    "chapters": task.scope.chapter_ids.len(),
                    "removed_files": removed,
                }))
            }
            kind => {
                let command = self.command_for(kind)?;
                for chapter_id in &task.scope.chapter_ids {
                    self.run_command(command, &task.scope.book_id, chapter_id, &task.log_path)
                        .await?;
                }
                info!(
                    task_id = %task.id,
                    kind = kind.as_str(),
                    chapters = task.scope.chapter_ids.len(),
                    "Generation task complete"
                );
                Ok(serde_json::json!({
                    "chapters": task.scope.chapter_ids.len(),
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::TaskScope;

    fn task(kind: TaskKind, log_path: PathBuf, chapters: &[&str]) -> Task {
        Task::new(
            kind,
            TaskScope {
                book_id: "foundation".to_string(),
                chapter_ids: chapters.iter().map(|c| c.to_string()).collect(),
            },
            log_path,
        )
    }

    fn settings_with(script_command: &str) -> TaskSettings {
        TaskSettings {
            script_command: script_command.to_string(),
            ..TaskSettings::default()
        }
    }

    #[tokio::test]
    async fn test_command_output_lands_in_log() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("logs/task.log");
        let executor =
            ProcessTaskExecutor::new(dir.path().to_path_buf(), settings_with("echo generating"));

        let task = task(TaskKind::GenerateScript, log_path.clone(), &["chapter0"]);
        let result = executor.execute(&task).await.unwrap();
        assert_eq!(result["chapters"], 1);

        let log = std::fs::read_to_string(&log_path).unwrap();
        assert!(log.contains("$ echo generating foundation chapter0"));
        assert!(log.contains("generating foundation chapter0"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_command_failed() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("task.log");
        let executor =
            ProcessTaskExecutor::new(dir.path().to_path_buf(), settings_with("false"));

        let task = task(TaskKind::GenerateScript, log_path, &["chapter0"]);
        let result = executor.execute(&task).await;
        assert!(matches!(
            result,
            Err(ExecutorError::CommandFailed { exit_code: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_failed() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("task.log");
        let executor = ProcessTaskExecutor::new(
            dir.path().to_path_buf(),
            settings_with("definitely-not-a-real-binary"),
        );

        let task = task(TaskKind::GenerateScript, log_path, &["chapter0"]);
        let result = executor.execute(&task).await;
        assert!(matches!(result, Err(ExecutorError::SpawnFailed { .. })));
    }

    #[tokio::test]
    async fn test_delete_removes_generated_artifacts_only() {
        let dir = tempfile::tempdir().unwrap();
        let chapter = dir.path().join("foundation/chapter0");
        std::fs::create_dir_all(chapter.join("assets")).unwrap();
        std::fs::write(chapter.join("podcast_script.txt"), "text").unwrap();
        std::fs::write(chapter.join("podcast.wav"), "audio").unwrap();
        std::fs::write(chapter.join("metadata.json"), "{}").unwrap();
        std::fs::write(chapter.join("assets/figure.png"), "png").unwrap();

        let executor =
            ProcessTaskExecutor::new(dir.path().to_path_buf(), TaskSettings::default());
        let task = task(
            TaskKind::Delete,
            dir.path().join("task.log"),
            &["chapter0"],
        );
        let result = executor.execute(&task).await.unwrap();
        assert_eq!(result["removed_files"], 3);

        assert!(!chapter.join("podcast_script.txt").exists());
        assert!(!chapter.join("podcast.wav").exists());
        assert!(!chapter.join("metadata.json").exists());
        // assets 与目录本身保留
        assert!(chapter.join("assets/figure.png").exists());
        assert!(chapter.is_dir());
    }
}
