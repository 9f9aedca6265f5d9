//! Quadlet file classification and systemd unit-name derivation.
//!
//! A quadlet is identified purely by its file extension; everything else in
//! the source tree is a companion file that gets mirrored but never produces
//! a service unit.

use std::path::Path;

/// The recognized Podman Quadlet file extensions. Closed set.
pub const QUADLET_EXTENSIONS: [&str; 7] = [
    "container", "volume", "network", "kube", "image", "build", "pod",
];

/// Returns true if the file has a quadlet extension (exact lowercase match).
pub fn is_quadlet_file(path: &Path) -> bool {
    extension(path).is_some_and(|ext| QUADLET_EXTENSIONS.contains(&ext))
}

/// Derive the systemd service unit name generated for a quadlet file.
///
/// Single-unit quadlets keep their base name (`web.container` →
/// `web.service`); resource quadlets carry a type infix so the generated
/// unit does not collide with a container of the same base name
/// (`db.volume` → `db-volume.service`).
///
/// Returns `None` for companion files.
pub fn unit_name(path: &Path) -> Option<String> {
    let ext = extension(path)?;
    let base = path.file_stem()?.to_str()?;
    let infix = match ext {
        "container" | "kube" | "pod" => "",
        "volume" => "-volume",
        "network" => "-network",
        "image" => "-image",
        "build" => "-build",
        _ => return None,
    };
    Some(format!("{base}{infix}.service"))
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn quadlet_extensions_are_recognized() {
        for ext in QUADLET_EXTENSIONS {
            let path = PathBuf::from(format!("/quadlets/app.{ext}"));
            assert!(is_quadlet_file(&path), "expected quadlet: {}", path.display());
        }
    }

    #[test]
    fn companion_files_are_not_quadlets() {
        for name in ["app.env", "config.yaml", "README.md", "Containerfile", "noext"] {
            assert!(!is_quadlet_file(Path::new(name)), "not a quadlet: {name}");
        }
    }

    #[test]
    fn uppercase_extension_is_a_companion() {
        assert!(!is_quadlet_file(Path::new("web.Container")));
        assert_eq!(unit_name(Path::new("web.CONTAINER")), None);
    }

    #[test]
    fn unit_names_follow_the_generator_mapping() {
        let cases = [
            ("web.container", "web.service"),
            ("app.kube", "app.service"),
            ("group.pod", "group.service"),
            ("db.volume", "db-volume.service"),
            ("lan.network", "lan-network.service"),
            ("base.image", "base-image.service"),
            ("ci.build", "ci-build.service"),
        ];
        for (file, unit) in cases {
            assert_eq!(
                unit_name(Path::new(file)).as_deref(),
                Some(unit),
                "mapping for {file}"
            );
        }
    }

    #[test]
    fn unit_name_uses_only_the_final_path_component() {
        assert_eq!(
            unit_name(Path::new("/home/user/.config/containers/systemd/web.container")).as_deref(),
            Some("web.service")
        );
    }

    #[test]
    fn companion_has_no_unit_name() {
        assert_eq!(unit_name(Path::new("app.env")), None);
        assert_eq!(unit_name(Path::new("Makefile")), None);
    }
}
