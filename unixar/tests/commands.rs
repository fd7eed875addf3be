use std::error::Error as StdError;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use unixar::{Config, Error};

struct TestDir {
    tmpdir: tempfile::TempDir,
}

impl TestDir {
    fn new() -> io::Result<TestDir> {
        Ok(TestDir {
            tmpdir: tempfile::tempdir()?,
        })
    }

    fn file(&self, path: impl AsRef<Path>) -> PathBuf {
        self.tmpdir.path().join(path)
    }
}

fn listing(archive: &Path, verbose: bool) -> Result<String, Box<dyn StdError>> {
    let mut out = Vec::new();
    unixar::list(archive, verbose, &Config::default(), &mut out)?;
    Ok(String::from_utf8(out)?)
}

fn names(names: &[&str]) -> Vec<OsString> {
    names.iter().map(OsString::from).collect()
}

#[test]
fn append_and_list() -> Result<(), Box<dyn StdError>> {
    let tmp = TestDir::new()?;
    fs::write(tmp.file("a"), b"alpha")?;
    fs::set_permissions(tmp.file("a"), fs::Permissions::from_mode(0o644))?;
    fs::write(tmp.file("b"), b"beta")?;

    let archive = tmp.file("test.a");
    unixar::append(&archive, &[tmp.file("a"), tmp.file("b")], &Config::default())?;

    assert_eq!(listing(&archive, false)?, "a\nb\n");

    let verbose = listing(&archive, true)?;
    let first = verbose.lines().next().ok_or("empty listing")?;
    assert!(first.starts_with("rw-r--r-- "), "{}", first);
    assert!(first.ends_with(" a"), "{}", first);
    Ok(())
}

#[test]
fn failures_do_not_stop_the_batch() -> Result<(), Box<dyn StdError>> {
    let tmp = TestDir::new()?;
    fs::write(tmp.file("a"), b"alpha")?;
    fs::write(tmp.file("b"), b"beta")?;
    let archive = tmp.file("test.a");

    let err = unixar::append(
        &archive,
        &[tmp.file("a"), tmp.file("missing"), tmp.file("b")],
        &Config::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Members { failed: 1, total: 3 }));
    assert_eq!(listing(&archive, false)?, "a\nb\n");

    let err = unixar::delete(&archive, &names(&["a", "nope"]), &Config::default()).unwrap_err();
    assert!(matches!(err, Error::Members { failed: 1, total: 2 }));
    assert_eq!(listing(&archive, false)?, "b\n");
    Ok(())
}

#[test]
fn extract_into_directory() -> Result<(), Box<dyn StdError>> {
    let tmp = TestDir::new()?;
    fs::write(tmp.file("a"), b"alpha")?;
    fs::write(tmp.file("b"), b"beta")?;
    let archive = tmp.file("test.a");
    unixar::append(&archive, &[tmp.file("a"), tmp.file("b")], &Config::default())?;

    fs::create_dir(tmp.file("out"))?;
    unixar::extract(&archive, &names(&["a"]), tmp.file("out"), &Config::default())?;
    assert_eq!(fs::read(tmp.file("out/a"))?, b"alpha");
    assert_eq!(listing(&archive, false)?, "b\n");

    // Names that would escape the directory are refused
    let err = unixar::extract(&archive, &names(&["../b"]), tmp.file("out"), &Config::default())
        .unwrap_err();
    assert!(matches!(err, Error::Members { failed: 1, total: 1 }));
    assert_eq!(listing(&archive, false)?, "b\n");
    Ok(())
}

#[test]
fn append_all_skips_the_archive() -> Result<(), Box<dyn StdError>> {
    let tmp = TestDir::new()?;
    let src = tmp.file("src");
    fs::create_dir(&src)?;
    fs::create_dir(src.join("nested"))?;
    fs::write(src.join("zeta"), b"z")?;
    fs::write(src.join("mu"), b"m")?;

    let archive = src.join("all.a");
    unixar::append_all(&archive, &src, &Config::default())?;

    // Neither the archive nor its lock file is picked up
    assert!(src.join(".all.a.lock").exists());
    assert_eq!(listing(&archive, false)?, "mu\nzeta\n");
    Ok(())
}
