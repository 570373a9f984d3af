use crate::{EventKey, MainlineKey, TagKey, TimelineKey, extrapolate};

/// Anything stored on a time-indexed track.
pub trait Keyframe {
    fn time(&self) -> f32;
}

impl Keyframe for MainlineKey {
    fn time(&self) -> f32 {
        self.time
    }
}

impl Keyframe for TimelineKey {
    fn time(&self) -> f32 {
        self.time
    }
}

impl Keyframe for TagKey {
    fn time(&self) -> f32 {
        self.time
    }
}

impl Keyframe for EventKey {
    fn time(&self) -> f32 {
        self.time
    }
}

/// The keyframe pair a query time falls between.
///
/// `end` is `None` when `start` is the final key of a non-looping track, or the only key of a
/// looping one.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Bracket {
    pub start: usize,
    pub end: Option<usize>,
}

impl Bracket {
    /// Whether the end key lies past the loop boundary.
    pub fn wraps(&self) -> bool {
        self.end.is_some_and(|end| end <= self.start)
    }
}

/// A read-only view over one keyframe track.
///
/// Successor links are computed from indices: `index + 1`, wrapping to `0` only when the owning
/// animation loops.
#[derive(Copy, Clone, Debug)]
pub struct Track<'a, K> {
    keys: &'a [K],
    looping: bool,
}

impl<'a, K: Keyframe> Track<'a, K> {
    pub fn new(keys: &'a [K], looping: bool) -> Self {
        Self { keys, looping }
    }

    pub fn keys(&self) -> &'a [K] {
        self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn next_index(&self, index: usize) -> Option<usize> {
        let next = index + 1;
        if next < self.keys.len() {
            Some(next)
        } else if self.looping && !self.keys.is_empty() {
            Some(0)
        } else {
            None
        }
    }

    /// Finds the bracket for `time`, resuming from `cursor` when one is supplied.
    ///
    /// A cursor that cannot reach the bracket within one pass over the track is treated as
    /// stale and the walk restarts from the first key. Returns `None` only for empty tracks.
    pub fn locate(&self, time: f32, cursor: Option<usize>) -> Option<Bracket> {
        if self.keys.is_empty() {
            return None;
        }

        if let Some(cursor) = cursor.filter(|&c| c > 0 && c < self.keys.len()) {
            if let Some(bracket) = self.walk(time, cursor) {
                return Some(bracket);
            }
            log::trace!("keyframe cursor {cursor} missed time {time}, rescanning track");
        }

        Some(self.walk(time, 0).unwrap_or_else(|| self.before_first()))
    }

    fn walk(&self, time: f32, from: usize) -> Option<Bracket> {
        let mut current = from;
        for _ in 0..self.keys.len() {
            let next = self.next_index(current);
            if self.keys[current].time() <= time {
                match next {
                    None => {
                        return Some(Bracket {
                            start: current,
                            end: None,
                        });
                    }
                    Some(n) if n == current => {
                        return Some(Bracket {
                            start: current,
                            end: None,
                        });
                    }
                    Some(n) if n == 0 || time < self.keys[n].time() => {
                        return Some(Bracket {
                            start: current,
                            end: Some(n),
                        });
                    }
                    Some(_) => {}
                }
            }
            current = next?;
        }
        None
    }

    // `time` precedes every key.
    fn before_first(&self) -> Bracket {
        let last = self.keys.len() - 1;
        if self.looping && last > 0 {
            Bracket {
                start: last,
                end: Some(0),
            }
        } else {
            Bracket {
                start: 0,
                end: None,
            }
        }
    }

    /// Progress of `time` through `bracket`; wrapped brackets measure the end key at
    /// `end.time + length`.
    pub fn progress(&self, bracket: Bracket, time: f32, length: f32) -> f32 {
        let Some(end) = bracket.end else {
            return 0.0;
        };
        let start_time = self.keys[bracket.start].time();
        let mut end_time = self.keys[end].time();
        let mut time = time;
        if bracket.wraps() {
            end_time += length;
            if time < start_time {
                time += length;
            }
        }
        extrapolate(start_time, end_time, time)
    }
}
