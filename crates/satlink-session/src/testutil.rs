use std::collections::VecDeque;
use std::io::{Read, Write};

/// Scripted transport double: reads come from a queue of canned chunks,
/// writes are captured for inspection. An exhausted read queue behaves like
/// a serial port with nothing buffered (times out).
pub(crate) struct ScriptedPort {
    pub reads: VecDeque<Vec<u8>>,
    pub written: Vec<u8>,
}

impl ScriptedPort {
    pub fn new<I, C>(reads: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        Self {
            reads: reads.into_iter().map(|c| c.as_ref().to_vec()).collect(),
            written: Vec::new(),
        }
    }

    pub fn silent() -> Self {
        Self::new(Vec::<Vec<u8>>::new())
    }
}

impl Read for ScriptedPort {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.reads.pop_front() {
            Some(mut chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    chunk.drain(..n);
                    self.reads.push_front(chunk);
                }
                Ok(n)
            }
            None => Err(std::io::Error::from(std::io::ErrorKind::TimedOut)),
        }
    }
}

impl Write for ScriptedPort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
