use anyhow::Result;
use pysh_core::interrupt;
use std::path::Path;

use super::{Dependency, DependencyMode, PackageBackend};
use crate::runner::Environment;
use crate::shell::ShellCommand;

/// conda packages, pinned `name=version`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CondaBackend;

impl PackageBackend for CondaBackend {
    fn key(&self) -> &'static str {
        "conda"
    }

    fn pin(&self, dep: &Dependency) -> String {
        format!("{}={}", dep.name, dep.version)
    }

    fn install(&self, env: &Environment<'_>, deps: &[Dependency], mode: DependencyMode) -> Result<()> {
        let mut cmd = ShellCommand::new("conda").literal("install").literal("--yes");
        if mode.is_offline() {
            cmd = cmd.literal("--offline");
        }
        let cmd = cmd.literal("--name").arg(env.name()).args(self.pins(deps));
        env.run(&cmd)?;
        Ok(())
    }

    /// Download every package the environment holds, interpreter included,
    /// as listed by `conda list --explicit`.
    fn download(&self, env: &Environment<'_>, _deps: &[Dependency], dest: &Path) -> Result<()> {
        let listing = env.run_in_environment(
            ShellCommand::new("conda").literal("list").literal("--explicit"),
        )?;
        for url in explicit_urls(&listing.stdout) {
            interrupt::check()?;
            let name = pysh_fs::download::file_name_from_url(url)
                .ok_or_else(|| anyhow::anyhow!("No file name in package URL {}", url))?;
            pysh_fs::download(url, &dest.join(name))?;
        }
        Ok(())
    }

    fn exports_environment(&self) -> bool {
        true
    }
}

/// Package URLs from `conda list --explicit` output: blank lines, comments
/// and the `@EXPLICIT` marker dropped, `#md5` suffixes stripped.
pub(crate) fn explicit_urls(listing: &str) -> Vec<&str> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && *line != "@EXPLICIT")
        .map(|line| line.split('#').next().unwrap_or(line).trim())
        .filter(|url| !url.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_urls() {
        let listing = "\
# This file may be used to create an environment using:
# platform: linux-64
@EXPLICIT

https://repo.anaconda.com/pkgs/main/linux-64/python-3.6.2-0.tar.bz2#0123abcd
https://repo.anaconda.com/pkgs/main/linux-64/numpy-1.11.3-py36_0.tar.bz2
";
        assert_eq!(
            explicit_urls(listing),
            [
                "https://repo.anaconda.com/pkgs/main/linux-64/python-3.6.2-0.tar.bz2",
                "https://repo.anaconda.com/pkgs/main/linux-64/numpy-1.11.3-py36_0.tar.bz2",
            ]
        );
    }

    #[test]
    fn test_explicit_urls_empty_listing() {
        assert!(explicit_urls("@EXPLICIT\n\n").is_empty());
    }

    #[test]
    fn test_download_fetches_every_listed_package() {
        use crate::testing::{PackageServer, RecordingRunner};
        use crate::ProcessOutput;
        use pysh_core::config::VarSource;
        use pysh_core::Settings;

        let server = PackageServer::start(&[
            ("python-3.6.2-0.tar.bz2", "python body"),
            ("numpy-1.11.3-py36_0.tar.bz2", "numpy body"),
        ])
        .unwrap();
        let listing = format!(
            "# platform: linux-64\n@EXPLICIT\n{}#0123abcd\n{}\n",
            server.url("python-3.6.2-0.tar.bz2"),
            server.url("numpy-1.11.3-py36_0.tar.bz2")
        );
        let runner = RecordingRunner::new();
        runner.on("conda list --explicit", move |_| {
            Ok(ProcessOutput {
                stdout: listing.clone(),
                stderr: String::new(),
            })
        });
        let tmp = tempfile::tempdir().unwrap();
        let s = Settings::from_source(&VarSource::new([(
            "PYSH_ROOT_PATH",
            tmp.path().to_string_lossy().to_string(),
        )]));
        let env = Environment::new(&s, &runner);
        let dest = tmp.path().join("conda");
        std::fs::create_dir_all(&dest).unwrap();

        CondaBackend.download(&env, &[], &dest).unwrap();

        assert_eq!(
            std::fs::read_to_string(dest.join("python-3.6.2-0.tar.bz2")).unwrap(),
            "python body"
        );
        assert_eq!(
            std::fs::read_to_string(dest.join("numpy-1.11.3-py36_0.tar.bz2")).unwrap(),
            "numpy body"
        );
        assert_eq!(server.requests(), 2);
    }

    #[test]
    fn test_download_missing_package_is_an_error() {
        use crate::testing::{PackageServer, RecordingRunner};
        use crate::ProcessOutput;
        use pysh_core::config::VarSource;
        use pysh_core::Settings;

        let server = PackageServer::start(&[]).unwrap();
        let listing = format!("@EXPLICIT\n{}\n", server.url("gone-1.0-0.tar.bz2"));
        let runner = RecordingRunner::new();
        runner.on("conda list --explicit", move |_| {
            Ok(ProcessOutput {
                stdout: listing.clone(),
                stderr: String::new(),
            })
        });
        let tmp = tempfile::tempdir().unwrap();
        let s = Settings::from_source(&VarSource::new([(
            "PYSH_ROOT_PATH",
            tmp.path().to_string_lossy().to_string(),
        )]));
        let env = Environment::new(&s, &runner);

        let err = CondaBackend.download(&env, &[], tmp.path()).unwrap_err();
        assert!(err.to_string().contains("gone-1.0-0.tar.bz2"));
    }
}
