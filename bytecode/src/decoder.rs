use crate::instruction::Instruction;

/// Walks a slice of program words and decodes them one by one.
///
/// Unlike the interpreter, which treats an undecodable word as fatal, the
/// decoder yields the raw opcode value so a listing can show it.
pub struct ProgramDecoder<'a> {
    words: &'a [u32],
    pos: usize,
}

impl<'a> ProgramDecoder<'a> {
    pub fn new(words: &'a [u32]) -> Self {
        Self { words, pos: 0 }
    }

    /// Current word offset in the stream.
    #[inline(always)]
    pub fn offset(&self) -> usize {
        self.pos
    }

    #[inline(always)]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.words.len()
    }

    pub fn decode_next(&mut self) -> Option<Result<Instruction, u8>> {
        let word = *self.words.get(self.pos)?;
        self.pos += 1;
        Some(Instruction::decode(word))
    }
}

impl Iterator for ProgramDecoder<'_> {
    type Item = Result<Instruction, u8>;

    fn next(&mut self) -> Option<Self::Item> {
        self.decode_next()
    }
}

/// One line per word: `radius  MNEMONIC operand`.
pub fn disassemble(words: &[u32], base: u32) -> String {
    let mut out = String::new();
    for (i, decoded) in ProgramDecoder::new(words).enumerate() {
        let radius = base as usize + i;
        let line = match decoded {
            Ok(instruction) => format!("{radius:>6}  {instruction}\n"),
            Err(op) => format!("{radius:>6}  ??? 0x{op:x}\n"),
        };
        out.push_str(&line);
    }
    out
}
