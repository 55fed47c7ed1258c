use asmcore::Cpu;

use crate::views::View;

/// Read-only projection of engine memory. Holds its own copy of the
/// bytes so scrolling never needs to reach into the engine; `update`
/// re-takes the snapshot and is safe to call redundantly.
pub struct MemoryView {
    snapshot: Vec<u8>,
    pc: u32,
    origin: usize,
    words_per_row: usize,
}

impl MemoryView {
    pub fn new(words_per_row: usize) -> Self {
        Self {
            snapshot: Vec::new(),
            pc: 0,
            origin: 0,
            words_per_row,
        }
    }

    /// Refresh the projection from the engine's current state.
    pub fn update(&mut self, cpu: &Cpu) {
        self.snapshot.clear();
        self.snapshot.extend_from_slice(cpu.memory());
        self.pc = cpu.pc();
        self.clamp_origin();
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn origin(&self) -> usize {
        self.origin
    }

    pub fn words_per_row(&self) -> usize {
        self.words_per_row
    }

    /// Visible rows starting at the scroll origin: `(address, words)`.
    pub fn rows(&self, count: usize) -> Vec<(usize, Vec<u32>)> {
        let stride = self.words_per_row * 4;
        (0..count)
            .map(|i| self.origin + i * stride)
            .take_while(|addr| *addr < self.snapshot.len())
            .map(|addr| {
                let words = (0..self.words_per_row)
                    .filter_map(|w| self.word_at(addr + w * 4))
                    .collect();
                (addr, words)
            })
            .collect()
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.origin = self.origin.saturating_sub(rows * self.words_per_row * 4);
    }

    pub fn scroll_down(&mut self, rows: usize) {
        self.origin += rows * self.words_per_row * 4;
        self.clamp_origin();
    }

    pub fn scroll_home(&mut self) {
        self.origin = 0;
    }

    fn word_at(&self, addr: usize) -> Option<u32> {
        let bytes = self.snapshot.get(addr..addr + 4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn clamp_origin(&mut self) {
        let stride = self.words_per_row * 4;
        let max_origin = self.snapshot.len().saturating_sub(stride);
        self.origin = self.origin.min(max_origin);
        self.origin &= !3;
    }
}

impl View for MemoryView {}
