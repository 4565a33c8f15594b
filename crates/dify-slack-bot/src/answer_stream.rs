//! Decoding of server-sent `data: {...}` lines into answer fragments.
//!
//! The workflow API streams events as lines of the form
//! `data: {"event": "...", "answer": "..."}`. Only string `answer` fields
//! contribute to the answer; any other or malformed line is skipped.

use bytes::Bytes;
use futures::stream::{self, Stream, TryStreamExt};
use futures::StreamExt;
use std::collections::VecDeque;

/// Splits a byte stream into lines and decodes fragments line by line.
///
/// Bytes are buffered until a newline arrives, so multi-byte characters split
/// across chunks decode correctly.
#[derive(Debug, Default)]
pub struct FragmentDecoder {
    pending: Vec<u8>,
}

impl FragmentDecoder {
    /// Fragments completed by `chunk`, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut fragments = Vec::new();
        while let Some(newline) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            fragments.extend(decode_line(&line));
        }
        fragments
    }

    /// Decodes a trailing line that had no newline.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        decode_line(&rest)
    }
}

fn decode_line(line: &[u8]) -> Option<String> {
    let line = std::str::from_utf8(line).ok()?.trim();
    let data = line.strip_prefix("data:")?.trim_start();
    let event: serde_json::Value = serde_json::from_str(data).ok()?;
    event.get("answer")?.as_str().map(str::to_owned)
}

/// Lazily yields answer fragments while `body` is read.
///
/// The stream ends after the body ends, or right after yielding the first
/// read error.
pub fn answer_fragments<S, E>(body: S) -> impl Stream<Item = Result<String, E>>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    let state = Some((body, FragmentDecoder::default(), VecDeque::new()));
    stream::unfold(state, |state| async move {
        let Some((mut body, mut decoder, mut ready)) = state else {
            return None;
        };
        loop {
            if let Some(fragment) = ready.pop_front() {
                return Some((Ok(fragment), Some((body, decoder, ready))));
            }
            match body.next().await {
                Some(Ok(chunk)) => ready.extend(decoder.push(&chunk)),
                Some(Err(e)) => return Some((Err(e), None)),
                None => return decoder.finish().map(|fragment| (Ok(fragment), None)),
            }
        }
    })
}

/// Concatenates all fragments in order.
pub async fn collect_answer<S, E>(fragments: S) -> Result<String, E>
where
    S: Stream<Item = Result<String, E>>,
{
    fragments
        .try_fold(String::new(), |mut answer, fragment| async move {
            answer.push_str(&fragment);
            Ok(answer)
        })
        .await
}
