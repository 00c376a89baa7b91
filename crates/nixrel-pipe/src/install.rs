//! Install script composition
//!
//! Produces the `installPhase` steps for each archive family. Dependencies are
//! put on the binaries' `PATH` with `wrapProgram`; OS-scoped dependencies are
//! guarded with `stdenvNoCC.isLinux`/`isDarwin` so the manifest stays
//! OS-agnostic and Nix decides at install time.

use nixrel_core::{ArchiveFamily, DependencyOs, NixDependency};

/// Placeholder substituted with each binary name
pub const BIN_PLACEHOLDER: &str = "{bin}";

/// Install steps for one archive family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallFragment {
    pub family: ArchiveFamily,
    /// Steps containing [`BIN_PLACEHOLDER`]
    pub steps: Vec<String>,
}

impl InstallFragment {
    /// Steps for a concrete binary
    pub fn expand(&self, bin: &str) -> Vec<String> {
        self.steps
            .iter()
            .map(|step| step.replace(BIN_PLACEHOLDER, bin))
            .collect()
    }
}

/// Compose the install fragments, one per family in `binary`, `tar`, `zip` order
pub fn compose(dependencies: &[NixDependency]) -> Vec<InstallFragment> {
    let wrap = wrap_lines(dependencies);

    ArchiveFamily::ALL
        .into_iter()
        .map(|family| {
            let mut steps = vec![copy_step(family).to_string()];
            steps.extend(wrap.iter().cloned());
            InstallFragment { family, steps }
        })
        .collect()
}

fn copy_step(family: ArchiveFamily) -> &'static str {
    match family {
        ArchiveFamily::Binary => "install -Dm755 $src $out/bin/{bin}",
        ArchiveFamily::Tar => "cp -vr ./{bin} $out/bin/{bin}",
        // zip extraction may drop the executable bit
        ArchiveFamily::Zip => "install -Dm755 ./{bin} $out/bin/{bin}",
    }
}

fn names(dependencies: &[NixDependency], os: DependencyOs) -> Vec<&str> {
    dependencies
        .iter()
        .filter(|d| d.os == os)
        .map(|d| d.name.as_str())
        .collect()
}

fn nix_list(items: &[&str]) -> String {
    format!("[ {} ]", items.join(" "))
}

fn wrap_program(path: &str) -> String {
    format!("wrapProgram $out/bin/{{bin}} --prefix PATH : ${{lib.makeBinPath {}}}", path)
}

fn wrap_lines(dependencies: &[NixDependency]) -> Vec<String> {
    if dependencies.is_empty() {
        return Vec::new();
    }

    let global = names(dependencies, DependencyOs::Any);
    let linux = names(dependencies, DependencyOs::Linux);
    let darwin = names(dependencies, DependencyOs::Darwin);

    if linux.is_empty() && darwin.is_empty() {
        return vec![wrap_program(&nix_list(&global))];
    }

    if !global.is_empty() {
        let mut path = format!("({}", nix_list(&global));
        if !linux.is_empty() {
            path.push_str(&format!(" ++ lib.optionals stdenvNoCC.isLinux {}", nix_list(&linux)));
        }
        if !darwin.is_empty() {
            path.push_str(&format!(" ++ lib.optionals stdenvNoCC.isDarwin {}", nix_list(&darwin)));
        }
        path.push(')');
        return vec![wrap_program(&path)];
    }

    let mut lines = Vec::new();
    for (guard, deps) in [("isLinux", &linux), ("isDarwin", &darwin)] {
        if !deps.is_empty() {
            lines.push(format!(
                "${{lib.optionalString stdenvNoCC.{} \"{}\"}}",
                guard,
                wrap_program(&nix_list(deps))
            ));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps_for(fragments: &[InstallFragment], family: ArchiveFamily) -> Vec<String> {
        fragments
            .iter()
            .find(|f| f.family == family)
            .map(|f| f.expand("foo"))
            .unwrap_or_default()
    }

    #[test]
    fn test_no_dependencies() {
        let fragments = compose(&[]);
        assert_eq!(fragments.len(), 3);
        assert_eq!(
            fragments.iter().map(|f| f.family).collect::<Vec<_>>(),
            ArchiveFamily::ALL.to_vec()
        );

        assert_eq!(steps_for(&fragments, ArchiveFamily::Binary), vec!["install -Dm755 $src $out/bin/foo"]);
        assert_eq!(steps_for(&fragments, ArchiveFamily::Tar), vec!["cp -vr ./foo $out/bin/foo"]);
        assert_eq!(steps_for(&fragments, ArchiveFamily::Zip), vec!["install -Dm755 ./foo $out/bin/foo"]);
        assert!(fragments.iter().all(|f| f.steps.iter().all(|s| !s.contains("wrapProgram"))));
    }

    #[test]
    fn test_global_dependencies() {
        let deps = vec![
            NixDependency::new("fish"),
            NixDependency::new("bash"),
            NixDependency::new("zsh"),
        ];
        let fragments = compose(&deps);

        assert_eq!(
            steps_for(&fragments, ArchiveFamily::Tar),
            vec![
                "cp -vr ./foo $out/bin/foo",
                "wrapProgram $out/bin/foo --prefix PATH : ${lib.makeBinPath [ fish bash zsh ]}",
            ]
        );
    }

    #[test]
    fn test_linux_only_dependencies() {
        let deps = vec![NixDependency::linux("foo"), NixDependency::linux("bar")];
        let steps = steps_for(&compose(&deps), ArchiveFamily::Tar);

        assert_eq!(
            steps,
            vec![
                "cp -vr ./foo $out/bin/foo",
                "${lib.optionalString stdenvNoCC.isLinux \"wrapProgram $out/bin/foo --prefix PATH : ${lib.makeBinPath [ foo bar ]}\"}",
            ]
        );
        assert!(steps.iter().all(|s| !s.contains("isDarwin")));
    }

    #[test]
    fn test_darwin_only_dependencies() {
        let deps = vec![NixDependency::darwin("foo"), NixDependency::darwin("bar")];
        let steps = steps_for(&compose(&deps), ArchiveFamily::Zip);

        assert_eq!(steps.len(), 2);
        assert!(steps[1].starts_with("${lib.optionalString stdenvNoCC.isDarwin "));
        assert!(steps.iter().all(|s| !s.contains("isLinux")));
    }

    #[test]
    fn test_mixed_dependencies() {
        let deps = vec![
            NixDependency::new("fish"),
            NixDependency::linux("foo"),
            NixDependency::darwin("bar"),
        ];
        let steps = steps_for(&compose(&deps), ArchiveFamily::Binary);

        assert_eq!(
            steps,
            vec![
                "install -Dm755 $src $out/bin/foo",
                "wrapProgram $out/bin/foo --prefix PATH : ${lib.makeBinPath ([ fish ] ++ lib.optionals stdenvNoCC.isLinux [ foo ] ++ lib.optionals stdenvNoCC.isDarwin [ bar ])}",
            ]
        );
    }

    #[test]
    fn test_scoped_without_globals_both_os() {
        let deps = vec![NixDependency::darwin("chromium"), NixDependency::linux("ttyd")];
        let steps = steps_for(&compose(&deps), ArchiveFamily::Tar);

        assert_eq!(steps.len(), 3);
        assert!(steps[1].contains("isLinux") && steps[1].contains("[ ttyd ]"));
        assert!(steps[2].contains("isDarwin") && steps[2].contains("[ chromium ]"));
    }

    #[test]
    fn test_composition_is_deterministic() {
        let deps = vec![NixDependency::new("git"), NixDependency::linux("xdg-utils")];
        assert_eq!(compose(&deps), compose(&deps));
    }
}
