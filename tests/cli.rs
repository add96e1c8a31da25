//! CLI integration tests

use assert_cmd::Command;
use image::{DynamicImage, Rgb, RgbImage};
use predicates::prelude::*;
use std::path::{Path, PathBuf};

fn spreadcut() -> Command {
    let mut cmd = Command::cargo_bin("spreadcut").unwrap();
    // keep the user's config file out of the tests
    cmd.env("XDG_CONFIG_HOME", "/nonexistent").env_remove("RUST_LOG");
    cmd
}

fn save(dir: &Path, name: &str, image: RgbImage) -> PathBuf {
    let path = dir.join(name);
    DynamicImage::ImageRgb8(image).save(&path).unwrap();
    path
}

fn spread() -> RgbImage {
    RgbImage::from_fn(800, 600, |x, _| match x {
        0..=398 => Rgb([30, 40, 80]),
        399..=400 => Rgb([0, 0, 0]),
        _ => Rgb([200, 200, 210]),
    })
}

fn wraparound() -> RgbImage {
    RgbImage::from_fn(1500, 600, |x, _| match x {
        0..=299 => Rgb([200, 190, 170]),
        300..=349 => Rgb([40, 30, 30]),
        350..=849 => Rgb([230, 60, 40]),
        850..=1199 => Rgb([245, 240, 230]),
        _ => Rgb([120, 120, 120]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // TC-CLI-001: info
    #[test]
    fn test_info_reports_spread() {
        let dir = tempfile::tempdir().unwrap();
        let input = save(dir.path(), "spread.png", spread());

        spreadcut()
            .arg("info")
            .arg(&input)
            .assert()
            .success()
            .stdout(predicate::str::contains("800x600"))
            .stdout(predicate::str::contains("Double page: yes"));
    }

    // TC-CLI-002: missing input
    #[test]
    fn test_missing_input_exit_code() {
        spreadcut()
            .args(["info", "/nonexistent/page.png"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("Image not found"));
    }

    // TC-CLI-003: split
    #[test]
    fn test_split_writes_page() {
        let dir = tempfile::tempdir().unwrap();
        let input = save(dir.path(), "spread.png", spread());
        let output = dir.path().join("left.png");

        spreadcut()
            .arg("split")
            .arg(&input)
            .args(["--side", "left", "-o"])
            .arg(&output)
            .assert()
            .success();

        let page = image::open(&output).unwrap();
        assert_eq!(page.height(), 600);
        assert!(page.width() < 800);
    }

    #[test]
    fn test_cover_side_prints_side() {
        let dir = tempfile::tempdir().unwrap();
        let input = save(dir.path(), "spread.png", spread());

        spreadcut()
            .arg("cover-side")
            .arg(&input)
            .assert()
            .success()
            .stdout(predicate::str::is_match("^(left|right)\n$").unwrap());
    }

    #[test]
    fn test_cover_region_crops() {
        let dir = tempfile::tempdir().unwrap();
        let input = save(dir.path(), "scan.png", wraparound());
        let output = dir.path().join("front.jpg");

        spreadcut()
            .arg("cover-region")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .assert()
            .success()
            .stdout(predicate::str::contains("Cover region"));

        assert_eq!(image::guess_format(&std::fs::read(&output).unwrap()).unwrap(), image::ImageFormat::Jpeg);
        let front = image::open(&output).unwrap();
        assert_eq!(front.height(), 600);
        assert!(front.width() < 1275);
    }

    #[test]
    fn test_cover_region_strict_without_frame() {
        let dir = tempfile::tempdir().unwrap();
        let input = save(dir.path(), "plain.png", RgbImage::from_pixel(900, 600, Rgb([90, 90, 90])));
        let output = dir.path().join("out.png");

        spreadcut()
            .arg("cover-region")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .arg("--strict")
            .assert()
            .code(4);
        assert!(!output.exists());

        // without --strict the input is copied
        spreadcut()
            .arg("cover-region")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .assert()
            .success();
        assert!(output.exists());
    }

    #[test]
    fn test_analyze_json_and_annotate() {
        let dir = tempfile::tempdir().unwrap();
        let input = save(dir.path(), "scan.png", wraparound());
        let overlay = dir.path().join("overlay.png");

        let output = spreadcut()
            .arg("analyze")
            .arg(&input)
            .arg("--json")
            .arg("--annotate")
            .arg(&overlay)
            .output()
            .unwrap();
        assert!(output.status.success());

        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["width"], 1500);
        assert_eq!(report["is_double_page"], true);
        assert_eq!(report["cover_region"]["outcome"], "cropped");
        assert_eq!(image::image_dimensions(&overlay).unwrap(), (1500, 600));
    }

    #[test]
    fn test_batch_split_both() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        save(input.path(), "p001.png", spread());
        save(input.path(), "p002.png", RgbImage::from_pixel(400, 600, Rgb([250, 250, 250])));

        spreadcut()
            .arg("batch")
            .arg(input.path())
            .arg("-o")
            .arg(output.path())
            .args(["--mode", "split-both", "-j", "2"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Succeeded:    2"));

        assert!(output.path().join("p001_left.png").exists());
        assert!(output.path().join("p001_right.png").exists());
        assert!(output.path().join("p002.png").exists());
    }

    #[test]
    fn test_batch_empty_directory() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();

        spreadcut()
            .arg("batch")
            .arg(input.path())
            .arg("-o")
            .arg(output.path())
            .assert()
            .code(3);
    }

    #[test]
    fn test_config_prints_effective_toml() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(&config, "[cover_region]\nedge_threshold = 42.0\n").unwrap();

        spreadcut()
            .arg("--config")
            .arg(&config)
            .args(["config", "--analysis-height", "250"])
            .assert()
            .success()
            .stdout(predicate::str::contains("edge_threshold = 42.0"))
            .stdout(predicate::str::contains("analysis_height = 250"));
    }

    #[test]
    fn test_invalid_override_exit_code() {
        spreadcut()
            .args(["config", "--analysis-height", "0"])
            .assert()
            .code(2);
    }

    #[test]
    fn test_unknown_side_rejected() {
        spreadcut()
            .args(["split", "in.png", "--side", "middle", "-o", "out.png"])
            .assert()
            .failure();
    }
}
