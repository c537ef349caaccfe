//! Queue: vote-ordered list of videos waiting for the player.
//!
//! DESIGN
//! ======
//! Entries are kept sorted by descending vote count. Ties go to the entry
//! inserted first, tracked by a per-queue sequence number that never
//! repeats. Since the order depends only on (votes, insertion sequence),
//! any interleaving of adds and vote toggles that ends in the same votes
//! ends in the same order.
//!
//! The queue knows nothing about the player. The "play immediately when
//! nothing is playing" rule lives in `Room::add_video`.

use uuid::Uuid;

use crate::services::video::Video;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    seq: u64,
    video: Video,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Queue {
    entries: Vec<Entry>,
    next_seq: u64,
}

impl Queue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Videos in play order: head first.
    pub fn iter(&self) -> impl Iterator<Item = &Video> {
        self.entries.iter().map(|e| &e.video)
    }

    #[must_use]
    pub fn contains(&self, id: Uuid) -> bool {
        self.find(id).is_some()
    }

    #[must_use]
    pub fn find(&self, id: Uuid) -> Option<&Video> {
        self.entries.iter().map(|e| &e.video).find(|v| v.id == id)
    }

    /// Enqueue a video with the submitter as its first voter.
    pub fn add(&mut self, submitter: Uuid, mut video: Video) {
        video.add_vote(submitter);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry { seq, video });
        self.reorder();
    }

    /// Remove a video by id. Returns it if it was queued.
    pub fn remove(&mut self, id: Uuid) -> Option<Video> {
        let index = self.entries.iter().position(|e| e.video.id == id)?;
        Some(self.entries.remove(index).video)
    }

    /// Flip `user_id`'s vote on a queued video and reorder.
    ///
    /// Returns `None` if the video is not queued, otherwise whether the user
    /// votes for it afterwards.
    pub fn toggle_vote(&mut self, user_id: Uuid, id: Uuid) -> Option<bool> {
        let entry = self.entries.iter_mut().find(|e| e.video.id == id)?;
        let voted = entry.video.toggle_vote(user_id);
        self.reorder();
        Some(voted)
    }

    /// Take the highest-ranked video off the queue.
    pub fn pop_head(&mut self) -> Option<Video> {
        if self.entries.is_empty() {
            return None;
        }
        Some(self.entries.remove(0).video)
    }

    fn reorder(&mut self) {
        self.entries.sort_by(|a, b| {
            b.video
                .vote_count()
                .cmp(&a.video.vote_count())
                .then(a.seq.cmp(&b.seq))
        });
    }
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod tests;
