use assert_cmd::Command;

fn help(bin: &str) -> String {
    let out = Command::cargo_bin(bin).unwrap().arg("--help").output().unwrap();
    assert!(out.status.success(), "{bin} --help failed");
    String::from_utf8(out.stdout).unwrap()
}

#[test]
fn phrase_generator_flags() {
    let text = help("mindful-phrases");
    for flag in [
        "--output",
        "--count",
        "--interval",
        "--continuous",
        "--no-display",
        "--api-key",
        "--config",
    ] {
        assert!(text.contains(flag), "missing {flag}");
    }
    assert!(text.contains("-n, --count"));
}

#[test]
fn video_assembler_flags() {
    let text = help("mindful-video");
    for flag in [
        "--pexels-key",
        "--cloudinary-name",
        "--cloudinary-key",
        "--cloudinary-secret",
        "--output",
        "--json",
        "--only-images",
        "--only-videos",
        "--font",
        "--no-upload",
        "--config",
    ] {
        assert!(text.contains(flag), "missing {flag}");
    }
}

#[test]
fn cycle_runner_flags() {
    let text = help("mindful-cycle");
    for flag in ["--json", "--interval", "--count", "--config"] {
        assert!(text.contains(flag), "missing {flag}");
    }
}

#[test]
fn conflicting_sources_are_rejected() {
    Command::cargo_bin("mindful-video")
        .unwrap()
        .args(["--only-images", "--only-videos"])
        .assert()
        .failure();
}

#[test]
fn zero_count_is_rejected() {
    Command::cargo_bin("mindful-phrases")
        .unwrap()
        .args(["--count", "0"])
        .assert()
        .failure();
}

#[test]
fn missing_explicit_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = Command::cargo_bin("mindful-phrases")
        .unwrap()
        .current_dir(dir.path())
        .env("GROQ_API_KEY", "test")
        .env("RUST_LOG", "info")
        .args(["--config", "no_such_config.json"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    let logged = format!(
        "{}{}",
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    assert!(logged.contains("no_such_config.json"), "{logged}");
}
