use crate::shared::frame::Frame;
use crate::video::domain::frame_source::FrameSourceError;

/// Frames sampled for one run, in original order.
pub struct SampledFrames {
    pub frames: Vec<Frame>,
    pub batches: usize,
    /// Set when a decode error cut the sequence short.
    pub truncated: bool,
}

/// Groups the sampled frame stream into bounded batches.
///
/// Pulls lazily, so a `max_frames` cap stops decoding early. A decode error
/// after the first sampled frame truncates the sequence; one before it is
/// returned to the caller.
pub struct FrameBatcher {
    batch_size: usize,
    max_frames: Option<usize>,
}

impl FrameBatcher {
    pub fn new(batch_size: usize, max_frames: Option<usize>) -> Self {
        Self {
            batch_size: batch_size.max(1),
            max_frames,
        }
    }

    pub fn batches<I>(&self, frames: I) -> Result<(Vec<Vec<Frame>>, bool), FrameSourceError>
    where
        I: Iterator<Item = Result<Frame, FrameSourceError>>,
    {
        let limit = self.max_frames.unwrap_or(usize::MAX);
        let mut batches: Vec<Vec<Frame>> = Vec::new();
        let mut current = Vec::with_capacity(self.batch_size);
        let mut sampled = 0usize;
        let mut truncated = false;

        for item in frames {
            match item {
                Ok(frame) => {
                    current.push(frame);
                    sampled += 1;
                    if current.len() == self.batch_size {
                        batches.push(std::mem::replace(
                            &mut current,
                            Vec::with_capacity(self.batch_size),
                        ));
                    }
                    if sampled >= limit {
                        break;
                    }
                }
                Err(e) if sampled > 0 => {
                    log::warn!("Truncating frame sequence after {sampled} frames: {e}");
                    truncated = true;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        if !current.is_empty() {
            batches.push(current);
        }
        Ok((batches, truncated))
    }

    /// Concatenates batches back into one ordered sequence.
    pub fn flatten(batches: Vec<Vec<Frame>>) -> Vec<Frame> {
        batches.into_iter().flatten().collect()
    }

    /// `batches` followed by `flatten`.
    pub fn sample<I>(&self, frames: I) -> Result<SampledFrames, FrameSourceError>
    where
        I: Iterator<Item = Result<Frame, FrameSourceError>>,
    {
        let (batches, truncated) = self.batches(frames)?;
        let count = batches.len();
        Ok(SampledFrames {
            frames: Self::flatten(batches),
            batches: count,
            truncated,
        })
    }
}
