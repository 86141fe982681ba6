// Ordered list of disjoint half-open-in-spirit (inclusive-inclusive) free
// intervals over the control store. Small N (512) makes a plain sorted
// `Vec` a better fit than an intrusive linked list.

use crate::errors::MalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub start: u16,
    pub end: u16,
}

impl Chunk {
    fn size(&self) -> u32 {
        u32::from(self.end) - u32::from(self.start) + 1
    }

    fn contains(&self, start: u16, end: u16) -> bool {
        self.start <= start && end <= self.end
    }
}

pub struct FreeChunkChain {
    chunks: Vec<Chunk>,
}

impl FreeChunkChain {
    pub fn new(size: u16) -> Self {
        FreeChunkChain {
            chunks: vec![Chunk {
                start: 0,
                end: size - 1,
            }],
        }
    }

    /// Removes `[s, e]` from whichever chunk fully contains it.
    pub fn reclaim(&mut self, s: u16, e: u16) -> Result<(), MalError> {
        let index = self
            .chunks
            .iter()
            .position(|c| c.contains(s, e))
            .ok_or_else(|| MalError::InfeasibleLayout {
                reason: format!("no free chunk contains [{s}, {e}]"),
            })?;

        let chunk = self.chunks[index];
        match (chunk.start == s, chunk.end == e) {
            (true, true) => {
                self.chunks.remove(index);
            }
            (true, false) => {
                self.chunks[index].start = e + 1;
            }
            (false, true) => {
                self.chunks[index].end = s - 1;
            }
            (false, false) => {
                let tail = Chunk {
                    start: e + 1,
                    end: chunk.end,
                };
                self.chunks[index].end = s - 1;
                self.chunks.insert(index + 1, tail);
            }
        }
        Ok(())
    }

    /// Returns the start address of the first chunk of at least `size` words.
    pub fn first_chunk_ge(&self, size: u32) -> Result<u16, MalError> {
        self.chunks
            .iter()
            .find(|c| c.size() >= size)
            .map(|c| c.start)
            .ok_or_else(|| MalError::InfeasibleLayout {
                reason: format!("no free chunk of size {size}"),
            })
    }

    /// Finds `(start1, start2)` such that blocks of `size1`/`size2` words
    /// starting there each lie entirely within a free chunk and
    /// `start2 - start1 == d`.
    pub fn displaced_pair(&self, size1: u32, size2: u32, d: u32) -> Result<(u16, u16), MalError> {
        for f1 in &self.chunks {
            let f1_start = u32::from(f1.start);
            if f1.size() < size1 {
                continue;
            }
            let window_lo = f1_start + d;
            let window_hi = f1_start + size1 - 1 + d;

            for f2 in &self.chunks {
                let f2_start = u32::from(f2.start);
                let f2_end = u32::from(f2.end);
                if f2_end < window_lo || f2_start > window_hi {
                    continue;
                }

                // Any i in [max(window_lo, f2_start), min(window_hi, f2_end)]
                // such that [i, i + size2 - 1] fits inside f2.
                let i_lo = window_lo.max(f2_start);
                let i_hi = window_hi.min(f2_end);
                if i_lo > i_hi {
                    continue;
                }
                if f2_end < i_lo + size2 - 1 {
                    continue;
                }

                let (start1, start2) = if f2_start > f1_start + d {
                    (f2_start - d, f2_start)
                } else if f2_start < f1_start + d {
                    (f1_start, f1_start + d)
                } else {
                    (f1_start, f1_start + d)
                };

                return Ok((start1 as u16, start2 as u16));
            }
        }

        Err(MalError::InfeasibleLayout {
            reason: format!("no displaced pair of sizes {size1}/{size2} at offset {d}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reclaim_splits_middle_chunk() {
        let mut chain = FreeChunkChain::new(16);
        chain.reclaim(4, 7).unwrap();
        assert_eq!(
            chain.chunks,
            vec![Chunk { start: 0, end: 3 }, Chunk { start: 8, end: 15 }]
        );
    }

    #[test]
    fn reclaim_whole_chunk_removes_it() {
        let mut chain = FreeChunkChain::new(4);
        chain.reclaim(0, 3).unwrap();
        assert!(chain.chunks.is_empty());
    }

    #[test]
    fn reclaim_disjoint_intervals_is_order_independent() {
        let mut a = FreeChunkChain::new(16);
        a.reclaim(0, 1).unwrap();
        a.reclaim(8, 9).unwrap();

        let mut b = FreeChunkChain::new(16);
        b.reclaim(8, 9).unwrap();
        b.reclaim(0, 1).unwrap();

        assert_eq!(a.chunks, b.chunks);
    }

    #[test]
    fn reclaim_not_contained_fails() {
        let mut chain = FreeChunkChain::new(16);
        chain.reclaim(4, 7).unwrap();
        assert!(matches!(
            chain.reclaim(6, 10),
            Err(MalError::InfeasibleLayout { .. })
        ));
    }

    #[test]
    fn first_chunk_ge_finds_smallest_fit() {
        let mut chain = FreeChunkChain::new(16);
        chain.reclaim(0, 2).unwrap();
        assert_eq!(chain.first_chunk_ge(4).unwrap(), 3);
        assert!(chain.first_chunk_ge(20).is_err());
    }

    #[test]
    fn displaced_pair_on_a_single_open_chain() {
        let chain = FreeChunkChain::new(512);
        let (else_start, if_start) = chain.displaced_pair(2, 4, 256).unwrap();
        assert_eq!(if_start - else_start, 256);
    }

    #[test]
    fn displaced_pair_infeasible_when_no_match() {
        let mut chain = FreeChunkChain::new(512);
        // Leave only a chunk at the top that can't host the +256 pair.
        chain.reclaim(0, 511 - 10).unwrap();
        assert!(chain.displaced_pair(20, 20, 256).is_err());
    }
}
