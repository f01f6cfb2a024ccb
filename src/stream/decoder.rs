use encoding_rs::{Decoder, DecoderResult, UTF_8};

use crate::core::errors::{AppError, AppResult};

/// Carries partial code points across chunk boundaries. Invalid UTF-8 is an
/// error, never replaced.
pub struct Utf8StreamDecoder {
    decoder: Decoder,
    consumed: usize,
    finished: bool,
}

impl Default for Utf8StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self {
            decoder: UTF_8.new_decoder_with_bom_removal(),
            consumed: 0,
            finished: false,
        }
    }

    pub fn decode(&mut self, chunk: &[u8]) -> AppResult<String> {
        self.decode_inner(chunk, false)
    }

    /// Flushes the decoder. A dangling partial sequence is an error.
    pub fn finish(&mut self) -> AppResult<String> {
        if self.finished {
            return Ok(String::new());
        }
        let tail = self.decode_inner(&[], true);
        self.finished = true;
        tail
    }

    fn decode_inner(&mut self, chunk: &[u8], last: bool) -> AppResult<String> {
        if self.finished {
            return Err(AppError::StreamDecode("decoder already finished".to_string()));
        }
        let capacity = self
            .decoder
            .max_utf8_buffer_length_without_replacement(chunk.len())
            .ok_or_else(|| AppError::StreamDecode("chunk too large".to_string()))?;
        let mut out = String::with_capacity(capacity);
        let (result, read) = self
            .decoder
            .decode_to_string_without_replacement(chunk, &mut out, last);
        self.consumed += read;
        match result {
            DecoderResult::InputEmpty => Ok(out),
            DecoderResult::Malformed(_, _) => {
                self.finished = true;
                Err(AppError::StreamDecode(format!(
                    "invalid UTF-8 near byte {}",
                    self.consumed
                )))
            }
            DecoderResult::OutputFull => Err(AppError::Internal(
                "decoder output buffer undersized".to_string(),
            )),
        }
    }
}
