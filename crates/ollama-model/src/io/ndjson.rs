use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
    InvalidPayload,
}

/// Reads newline-delimited records from a chunk stream.
///
/// Streaming endpoints of the server emit one JSON object per line, and
/// a network chunk may end in the middle of a line (or of a multi-byte
/// character), so bytes are buffered until a full line is available.
pub struct NdJson {
    buf: Vec<u8>,
    chunks: Chunks,
    eof: bool,
}

impl NdJson {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: Vec::new(),
            chunks,
            eof: false,
        }
    }

    /// Returns the next non-empty line, without its line terminator.
    pub async fn next_line(&mut self) -> Result<Option<String>, Error> {
        loop {
            if let Some(line) = self.take_line()? {
                if line.is_empty() {
                    continue;
                }
                return Ok(Some(line));
            }

            if self.eof {
                // Whatever is left is the last record without a newline.
                if self.buf.is_empty() {
                    return Ok(None);
                }
                let rest = std::mem::take(&mut self.buf);
                let line = decode_line(&rest)?;
                return Ok((!line.is_empty()).then_some(line));
            }

            match self.chunks.next_chunk().await.map_err(Error::ChunksError)? {
                Some(bytes) => self.buf.extend_from_slice(&bytes),
                None => self.eof = true,
            }
        }
    }

    fn take_line(&mut self) -> Result<Option<String>, Error> {
        let Some(eol_idx) = self.buf.iter().position(|b| *b == b'\n') else {
            return Ok(None);
        };
        let line = decode_line(&self.buf[..eol_idx])?;
        self.buf.drain(..=eol_idx);
        Ok(Some(line))
    }
}

fn decode_line(bytes: &[u8]) -> Result<String, Error> {
    let Ok(s) = str::from_utf8(bytes) else {
        return Err(Error::InvalidPayload);
    };
    Ok(s.trim_end_matches('\r').trim().to_owned())
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn reader(chunks: Vec<&'static [u8]>) -> NdJson {
        NdJson::new(Chunks::from_vec_deque(
            chunks.into_iter().map(Bytes::from_static).collect(),
        ))
    }

    #[tokio::test]
    async fn test_normal_lines() {
        let mut lines = reader(vec![b"{\"a\":1}\n{\"a\":2}\n"]);
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "{\"a\":1}");
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "{\"a\":2}");
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_split_chunks() {
        // "é" is split across two chunks.
        let mut lines =
            reader(vec![b"{\"text\":\"caf", b"\xc3", b"\xa9\"}\r\n\n", b"{}"]);
        assert_eq!(
            lines.next_line().await.unwrap().unwrap(),
            "{\"text\":\"café\"}"
        );
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "{}");
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_utf8() {
        let mut lines = reader(vec![b"\xff\xfe\n"]);
        assert_eq!(lines.next_line().await.unwrap_err(), Error::InvalidPayload);
    }
}
