//! Fixed-size slide pagination with wraparound navigation. Used for the
//! project image gallery (one image per slide) and the related-projects strip
//! (three cards per slide).

use std::time::Duration;

pub const GALLERY_PAGE_SIZE: usize = 1;
pub const RELATED_PAGE_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Carousel<T> {
    slides: Vec<Vec<T>>,
    active: usize,
    auto_advance: Option<Duration>,
}

/// Repeat the whole list until it holds at least `min` entries, so a short
/// list still fills a slide. Empty stays empty.
pub fn pad_cyclic<T: Clone>(items: &[T], min: usize) -> Vec<T> {
    let mut out = items.to_vec();
    if items.is_empty() {
        return out;
    }
    while out.len() < min {
        out.extend_from_slice(items);
    }
    out
}

impl<T: Clone> Carousel<T> {
    /// `ceil(n / page_size)` slides; slide `i` holds
    /// `items[(i * page_size + j) % n]` for `j` in `0..page_size`, so the last
    /// slide wraps around to the start instead of being short.
    pub fn paginate(items: &[T], page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let n = items.len();
        let count = n.div_ceil(page_size);
        let slides = (0..count)
            .map(|i| {
                (0..page_size)
                    .map(|j| items[(i * page_size + j) % n].clone())
                    .collect()
            })
            .collect();
        Carousel {
            slides,
            active: 0,
            auto_advance: None,
        }
    }
}

impl<T> Carousel<T> {
    pub fn with_auto_advance(mut self, interval: Option<Duration>) -> Self {
        self.auto_advance = interval.filter(|d| !d.is_zero());
        self
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Navigation controls are only worth drawing with something to move to.
    pub fn has_controls(&self) -> bool {
        self.slides.len() > 1
    }

    pub fn slides(&self) -> &[Vec<T>] {
        &self.slides
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn active_slide(&self) -> Option<&[T]> {
        self.slides.get(self.active).map(Vec::as_slice)
    }

    pub fn auto_advance(&self) -> Option<Duration> {
        self.auto_advance
    }

    pub fn next_index(&self) -> usize {
        match self.slides.len() {
            0 => 0,
            n => (self.active + 1) % n,
        }
    }

    pub fn prev_index(&self) -> usize {
        match self.slides.len() {
            0 => 0,
            n => (self.active + n - 1) % n,
        }
    }

    /// Manual navigation; cancels auto-advance.
    pub fn next(&mut self) {
        self.auto_advance = None;
        self.active = self.next_index();
    }

    /// Manual navigation; cancels auto-advance.
    pub fn prev(&mut self) {
        self.auto_advance = None;
        self.active = self.prev_index();
    }

    /// Manual navigation; `index` wraps modulo the slide count.
    pub fn go_to(&mut self, index: usize) {
        self.auto_advance = None;
        if !self.slides.is_empty() {
            self.active = index % self.slides.len();
        }
    }

    /// Timer-driven advance. Returns false once auto-advance is off.
    pub fn tick(&mut self) -> bool {
        if self.auto_advance.is_none() || self.slides.is_empty() {
            return false;
        }
        self.active = self.next_index();
        true
    }
}
