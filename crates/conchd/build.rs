//! Build script: render the conchd man page for packaging.

use std::{env, fs, io, path::Path, path::PathBuf};
use time::{OffsetDateTime, format_description::well_known::Iso8601};

const FALLBACK_DATE: &str = "1970-01-01";

fn manual_date() -> String {
    let Ok(raw) = env::var("SOURCE_DATE_EPOCH") else {
        return FALLBACK_DATE.into();
    };

    let parsed = raw
        .parse::<i64>()
        .ok()
        .and_then(|seconds| OffsetDateTime::from_unix_timestamp(seconds).ok())
        .and_then(|date| date.format(&Iso8601::DATE).ok());

    parsed.unwrap_or_else(|| {
        println!(
            "cargo:warning=Ignoring SOURCE_DATE_EPOCH '{raw}'; expected integer seconds since \
             the Unix epoch; using {FALLBACK_DATE}"
        );
        FALLBACK_DATE.into()
    })
}

fn generated_man_dir() -> PathBuf {
    let target = env::var("TARGET").unwrap_or_else(|_| "unknown-target".into());
    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown-profile".into());

    // OUT_DIR is {target_dir}/{profile}/build/{crate}-{hash}/out.
    let base = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .and_then(|out| out.ancestors().nth(4).map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("target"));
    base.join(format!("generated-man/{target}/{profile}"))
}

fn write_page(contents: &str, dir: &Path, page_name: &str) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let staged = dir.join(format!("{page_name}.tmp"));
    fs::write(&staged, contents)?;
    fs::rename(&staged, dir.join(page_name))
}

fn render(binary: &str, version: &str, date: &str) -> String {
    let title = binary.to_uppercase();
    format!(
        ".TH \"{title}\" \"1\" \"{date}\" \"{binary} {version}\" \"Conch REPL Server\"\n\
.SH NAME\n\
{binary} \\- shared-namespace TCP REPL server\n\
.SH SYNOPSIS\n\
.B {binary}\n\
[\\fB\\-\\-listen\\fR \\fItcp://HOST:PORT\\fR]\n\
[\\fB\\-\\-tick\\-interval\\-ms\\fR \\fIMS\\fR]\n\
[\\fB\\-\\-config\\-path\\fR \\fIFILE\\fR]\n\
.SH DESCRIPTION\n\
{binary} accepts plain-text TCP connections and evaluates each newline\n\
terminated command against one namespace shared by every client. The\n\
server is single threaded and advances in short, non-blocking ticks.\n\
Send \\fBexit\\fR or \\fBquit\\fR to disconnect.\n\
.SH ENVIRONMENT\n\
Every option may also be set through a \\fBCONCH_\\fR prefixed variable,\n\
for example \\fBCONCH_LISTEN\\fR.\n"
    )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    println!("cargo:rerun-if-env-changed=TARGET");
    println!("cargo:rerun-if-env-changed=PROFILE");

    let binary = env::var("CARGO_PKG_NAME").unwrap_or_else(|_| "conchd".into());
    let version = env::var("CARGO_PKG_VERSION")
        .map_err(|_| "CARGO_PKG_VERSION must be set by Cargo to render the man page")?;

    let page = render(&binary, &version, &manual_date());
    let page_name = format!("{binary}.1");
    write_page(&page, &generated_man_dir(), &page_name)?;

    if let Some(out_dir) = env::var_os("OUT_DIR") {
        let out_dir = PathBuf::from(out_dir);
        if let Err(error) = write_page(&page, &out_dir, &page_name) {
            println!(
                "cargo:warning=Failed to stage man page in OUT_DIR ({}): {error}",
                out_dir.display()
            );
        }
    }

    Ok(())
}
