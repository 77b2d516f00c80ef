use super::{types::*, Engine};
use crate::{config::Config, util::ensure_dir};
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

static BBOX_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<word xMin="([0-9.+-]+)" yMin="([0-9.+-]+)" xMax="([0-9.+-]+)" yMax="([0-9.+-]+)">(.*?)</word>"#,
    )
    .expect("static bbox regex")
});

pub struct PopplerEngine {
    cfg: Config,
    work_dir: PathBuf,
    raster_seq: AtomicU64,
}

impl PopplerEngine {
    pub fn new(cfg: &Config) -> Self {
        Self {
            cfg: cfg.clone(),
            work_dir: PathBuf::from(&cfg.paths.work_dir),
            raster_seq: AtomicU64::new(0),
        }
    }

    fn timeout(&self) -> Option<Duration> {
        match self.cfg.tools.page_timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    fn run<I, S>(&self, exe: &str, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(exe);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        debug!("run {:?} timeout={:?}", cmd, self.timeout());

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning {exe}"))?;

        let output = match self.timeout() {
            Some(t) => wait_with_timeout(&mut child, t)?,
            None => child
                .wait_with_output()
                .with_context(|| format!("waiting for {exe}"))?,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("{exe} failed ({}): {}", output.status, stderr.trim()));
        }
        Ok(output)
    }

    fn version_of(&self, tool: &str, exe: &str, flag: &str) -> ToolDiag {
        match self.run(exe, [flag]) {
            Ok(out) => {
                // poppler prints its banner on stderr, tesseract on stdout
                let text = format!(
                    "{}\n{}",
                    String::from_utf8_lossy(&out.stdout),
                    String::from_utf8_lossy(&out.stderr)
                );
                ToolDiag {
                    tool: tool.to_string(),
                    exe: exe.to_string(),
                    ok: true,
                    version: text
                        .lines()
                        .map(str::trim)
                        .find(|l| !l.is_empty())
                        .map(str::to_string),
                    error: None,
                }
            }
            Err(err) => ToolDiag {
                tool: tool.to_string(),
                exe: exe.to_string(),
                ok: false,
                version: None,
                error: Some(format!("{err:#}")),
            },
        }
    }
}

impl Engine for PopplerEngine {
    fn doctor(&self) -> Result<Vec<ToolDiag>> {
        let t = &self.cfg.tools;
        Ok(vec![
            self.version_of("pdfinfo", &t.pdfinfo, "-v"),
            self.version_of("pdftotext", &t.pdftotext, "-v"),
            self.version_of("pdftoppm", &t.pdftoppm, "-v"),
            self.version_of("tesseract", &t.tesseract, "--version"),
        ])
    }

    fn page_count(&self, input: &Path) -> Result<u32> {
        let out = self.run(&self.cfg.tools.pdfinfo, [input.as_os_str()])?;
        parse_page_count(&String::from_utf8_lossy(&out.stdout))
            .ok_or_else(|| anyhow!("pdfinfo reported no page count for {}", input.display()))
    }

    fn text_fragments(&self, input: &Path, page: u32) -> Result<Vec<TextFragment>> {
        let page_arg = page.to_string();
        let out = self.run(
            &self.cfg.tools.pdftotext,
            [
                OsStr::new("-bbox"),
                OsStr::new("-q"),
                OsStr::new("-f"),
                OsStr::new(&page_arg),
                OsStr::new("-l"),
                OsStr::new(&page_arg),
                input.as_os_str(),
                OsStr::new("-"),
            ],
        )?;
        Ok(parse_bbox_words(&String::from_utf8_lossy(&out.stdout)))
    }

    fn ocr_page(&self, input: &Path, page: u32, lang: &str) -> Result<String> {
        ensure_dir(&self.work_dir)?;
        // unique per call: concurrent parses in one process share work_dir
        let seq = self.raster_seq.fetch_add(1, Ordering::Relaxed);
        let prefix = self
            .work_dir
            .join(format!("page-{}-{seq}-{page:05}", std::process::id()));
        let image = prefix.with_extension("png");
        let page_arg = page.to_string();
        let dpi = self.cfg.ocr.dpi().to_string();

        self.run(
            &self.cfg.tools.pdftoppm,
            [
                OsStr::new("-r"),
                OsStr::new(&dpi),
                OsStr::new("-f"),
                OsStr::new(&page_arg),
                OsStr::new("-l"),
                OsStr::new(&page_arg),
                OsStr::new("-png"),
                OsStr::new("-singlefile"),
                input.as_os_str(),
                prefix.as_os_str(),
            ],
        )
        .with_context(|| format!("rendering page {page}"))?;

        let psm = self.cfg.ocr.psm.to_string();
        let res = self.run(
            &self.cfg.tools.tesseract,
            [
                image.as_os_str(),
                OsStr::new("stdout"),
                OsStr::new("-l"),
                OsStr::new(lang),
                OsStr::new("--psm"),
                OsStr::new(&psm),
            ],
        );

        if let Err(err) = std::fs::remove_file(&image) {
            warn!("could not remove {}: {err}", image.display());
        }

        let out = res.with_context(|| format!("recognizing page {page}"))?;
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

pub fn parse_page_count(pdfinfo: &str) -> Option<u32> {
    pdfinfo
        .lines()
        .find_map(|l| l.strip_prefix("Pages:"))
        .and_then(|rest| rest.trim().parse().ok())
}

/// Words from `pdftotext -bbox` output; the bottom edge stands in for the baseline.
pub fn parse_bbox_words(xhtml: &str) -> Vec<TextFragment> {
    BBOX_WORD
        .captures_iter(xhtml)
        .filter_map(|c| {
            Some(TextFragment {
                x_min: c[1].parse().ok()?,
                x_max: c[3].parse().ok()?,
                y: c[4].parse().ok()?,
                text: decode_entities(&c[5]),
            })
        })
        .collect()
}

fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<Output> {
    // Drain pipes while waiting so a chatty tool can't block on a full buffer.
    let stdout_reader = child.stdout.take();
    let stderr_reader = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout_reader {
            out.read_to_end(&mut buf).with_context(|| "read stdout")?;
        }
        Ok(buf)
    });

    let stderr_thread = std::thread::spawn(move || -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr_reader {
            err.read_to_end(&mut buf).with_context(|| "read stderr")?;
        }
        Ok(buf)
    });

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().with_context(|| "try_wait")? {
            let stdout = stdout_thread
                .join()
                .map_err(|_| anyhow!("stdout reader thread panicked"))??;
            let stderr = stderr_thread
                .join()
                .map_err(|_| anyhow!("stderr reader thread panicked"))??;
            return Ok(Output {
                status,
                stdout,
                stderr,
            });
        }

        if start.elapsed() > timeout {
            warn!("subprocess timed out after {:?}", timeout);
            let _ = child.kill();
            child.wait().with_context(|| "wait after kill")?;
            let stderr = stderr_thread
                .join()
                .map_err(|_| anyhow!("stderr reader thread panicked"))??;
            return Err(anyhow!(
                "subprocess exceeded timeout ({:?}); stderr: {}",
                timeout,
                String::from_utf8_lossy(&stderr)
            ));
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}
