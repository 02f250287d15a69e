//! Fixtures shared by the unit tests.

use std::fs;
use std::path::{Path, PathBuf};

/// Writes an executable `/bin/sh` script standing in for an external tool.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Fake samtools: `sort -n` copies the BAM to stdout, `fastq -1/-2` copies stdin
/// to both mates and `fastq -o` copies the BAM to the output.
/// A BAM whose content starts with `corrupt` makes every stage fail, one starting
/// with `partial` streams its reads before the sort fails, and one starting with
/// `noisy` floods the sort's stderr before streaming.
#[cfg(unix)]
pub fn fake_samtools(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "samtools",
        r#"case "$1" in
  --version) echo "samtools 1.17"; exit 0 ;;
  sort)
    if grep -q '^corrupt' "$3"; then echo "truncated file" >&2; exit 1; fi
    if grep -q '^partial' "$3"; then cat "$3"; echo "truncated file" >&2; exit 1; fi
    if grep -q '^noisy' "$3"; then head -c 200000 /dev/zero | tr '\0' x >&2; fi
    cat "$3" ;;
  fastq)
    if [ "$2" = "-o" ]; then
      if grep -q '^corrupt' "$4"; then echo "truncated file" >&2; exit 1; fi
      cat "$4" > "$3"
    else
      data=$(cat)
      if [ -z "$data" ]; then echo "no input" >&2; exit 1; fi
      printf '%s\n' "$data" > "$4"
      printf '%s\n' "$data" > "$6"
    fi ;;
  *) exit 2 ;;
esac
"#,
    )
}

/// Fake read removal tool: copies the inputs to `<prefix>.reads_N.fastq.gz`,
/// failing when the first input contains `host-only`.
#[cfg(unix)]
pub fn fake_decontaminator(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "readItAndKeep",
        r#"if [ "$1" = "--version" ]; then echo "0.3.0"; exit 0; fi
ref=""; r1=""; r2=""; prefix=""
while [ $# -gt 0 ]; do
  case "$1" in
    --ref_fasta) ref="$2"; shift 2 ;;
    --reads1) r1="$2"; shift 2 ;;
    --reads2) r2="$2"; shift 2 ;;
    --outprefix) prefix="$2"; shift 2 ;;
    *) shift ;;
  esac
done
if grep -q 'host-only' "$r1"; then echo "no reads kept for $r1" >&2; exit 1; fi
cp "$r1" "$prefix.reads_1.fastq.gz"
if [ -n "$r2" ]; then cp "$r2" "$prefix.reads_2.fastq.gz"; fi
echo "kept reads against $ref" >&2
"#,
    )
}
