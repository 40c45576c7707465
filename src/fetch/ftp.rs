// src/fetch/ftp.rs

//! Just enough FTP to pull one file from an anonymous server in passive mode.

use anyhow::{anyhow, bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::Path,
    time::Duration,
};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    time::timeout,
};
use tracing::{debug, warn};
use url::Url;

const DEFAULT_PORT: u16 = 21;

static PASV_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,3}),(\d{1,3}),(\d{1,3}),(\d{1,3}),(\d{1,3}),(\d{1,3})")
        .expect("PASV pattern should compile")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub text: String,
}

/// Code of a reply line and whether it ends the reply.
fn reply_line(line: &str) -> Option<(u16, bool)> {
    let code = line.get(0..3)?.parse().ok()?;
    match line.as_bytes().get(3) {
        Some(b'-') => Some((code, false)),
        Some(b' ') | None => Some((code, true)),
        _ => None,
    }
}

/// Address announced in a `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)` reply.
pub fn parse_pasv(text: &str) -> Result<SocketAddr> {
    let caps = PASV_RE
        .captures(text)
        .ok_or_else(|| anyhow!("no address in PASV reply {text:?}"))?;
    let mut n = [0u8; 6];
    for (i, slot) in n.iter_mut().enumerate() {
        *slot = caps[i + 1]
            .parse()
            .with_context(|| format!("bad PASV octet in {text:?}"))?;
    }
    let ip = Ipv4Addr::new(n[0], n[1], n[2], n[3]);
    let port = u16::from(n[4]) << 8 | u16::from(n[5]);
    Ok(SocketAddr::new(IpAddr::V4(ip), port))
}

/// Remote directory and file name of a URL path, without the leading `/`.
fn split_remote_path(path: &str) -> (&str, &str) {
    let path = path.trim_start_matches('/');
    match path.rfind('/') {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("", path),
    }
}

struct Session {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    peer: IpAddr,
    io_timeout: Duration,
}

impl Session {
    async fn connect(host: &str, port: u16, io_timeout: Duration) -> Result<Self> {
        let stream = timeout(io_timeout, TcpStream::connect((host, port)))
            .await
            .with_context(|| format!("timed out connecting to {host}:{port}"))?
            .with_context(|| format!("connecting to {host}:{port}"))?;
        let peer = stream.peer_addr()?.ip();
        let (r, w) = stream.into_split();
        let mut session = Self {
            reader: BufReader::new(r),
            writer: w,
            peer,
            io_timeout,
        };

        let greeting = session.read_reply().await?;
        if greeting.code != 220 {
            bail!("unexpected FTP greeting: {}", greeting.text.trim());
        }
        Ok(session)
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        let mut text = String::new();
        let mut open: Option<u16> = None;
        loop {
            let mut line = String::new();
            let n = timeout(self.io_timeout, self.reader.read_line(&mut line))
                .await
                .context("timed out waiting for FTP reply")??;
            if n == 0 {
                bail!("FTP server closed the control connection");
            }
            let line = line.trim_end_matches(&['\r', '\n'][..]);
            text.push_str(line);
            text.push('\n');

            match (open, reply_line(line)) {
                (None, Some((code, true))) => return Ok(Reply { code, text }),
                (None, Some((code, false))) => open = Some(code),
                (None, None) => bail!("malformed FTP reply {line:?}"),
                (Some(code), Some((c, true))) if c == code => return Ok(Reply { code, text }),
                (Some(_), _) => {}
            }
        }
    }

    async fn command(&mut self, cmd: &str) -> Result<Reply> {
        debug!(cmd = %cmd, "ftp >");
        timeout(
            self.io_timeout,
            self.writer.write_all(format!("{cmd}\r\n").as_bytes()),
        )
        .await
        .context("timed out sending FTP command")??;
        let reply = self.read_reply().await?;
        debug!(code = reply.code, "ftp <");
        Ok(reply)
    }

    async fn expect(&mut self, cmd: &str, codes: &[u16]) -> Result<Reply> {
        let reply = self.command(cmd).await?;
        if !codes.contains(&reply.code) {
            bail!("{cmd} rejected: {}", reply.text.trim());
        }
        Ok(reply)
    }

    async fn login_anonymous(&mut self) -> Result<()> {
        let reply = self.command("USER anonymous").await?;
        match reply.code {
            230 => Ok(()),
            331 | 332 => self.expect("PASS anonymous@", &[230, 202]).await.map(|_| ()),
            _ => bail!("anonymous login refused: {}", reply.text.trim()),
        }
    }

    /// Data address for the next transfer. The announced host is ignored in
    /// favour of the control peer; servers behind NAT often announce a
    /// private address.
    async fn passive(&mut self) -> Result<SocketAddr> {
        let reply = self.expect("PASV", &[227]).await?;
        let announced = parse_pasv(&reply.text)?;
        Ok(SocketAddr::new(self.peer, announced.port()))
    }

    async fn retrieve(&mut self, remote: &str, dest: &Path) -> Result<u64> {
        let data_addr = self.passive().await?;
        let mut data = timeout(self.io_timeout, TcpStream::connect(data_addr))
            .await
            .context("timed out opening FTP data connection")??;

        let reply = self.command(&format!("RETR {remote}")).await?;
        if !matches!(reply.code, 125 | 150) {
            bail!("RETR {remote} rejected: {}", reply.text.trim());
        }

        let mut file = File::create(dest)
            .await
            .with_context(|| format!("creating {}", dest.display()))?;
        let mut buf = vec![0u8; 64 * 1024];
        let mut written = 0u64;
        loop {
            let n = timeout(self.io_timeout, data.read(&mut buf))
                .await
                .context("timed out reading FTP data")??;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n]).await?;
            written += n as u64;
        }
        file.flush().await?;
        drop(data);

        let done = self.read_reply().await?;
        if !matches!(done.code, 226 | 250) {
            bail!("transfer of {remote} incomplete: {}", done.text.trim());
        }
        Ok(written)
    }
}

/// Fetch an `ftp://` URL into `dest` as an anonymous user.
///
/// Changes into the URL's directory first; when that is refused, retries
/// from `/` with the full path.
pub async fn download(url: &Url, dest: &Path, io_timeout: Duration) -> Result<u64> {
    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("no host in {url}"))?;
    let port = url.port().unwrap_or(DEFAULT_PORT);
    let (dir, file) = split_remote_path(url.path());
    if file.is_empty() {
        bail!("no file name in {url}");
    }

    let mut session = Session::connect(host, port, io_timeout).await?;
    session.login_anonymous().await?;
    session.expect("TYPE I", &[200]).await?;

    let remote = if dir.is_empty() {
        file.to_string()
    } else {
        let reply = session.command(&format!("CWD {dir}")).await?;
        if matches!(reply.code, 200 | 250) {
            file.to_string()
        } else {
            warn!(dir, reply = reply.text.trim(), "CWD refused, using absolute path");
            session.expect("CWD /", &[200, 250]).await?;
            format!("{dir}/{file}")
        }
    };

    let written = session.retrieve(&remote, dest).await?;
    if let Err(e) = session.command("QUIT").await {
        debug!(error = %e, "QUIT failed");
    }
    Ok(written)
}
