/// Pulls fixed or variable sized runs of bytes off an iterator, failing on
/// early end of stream instead of handing back a short run.
pub trait TakeBytes {
    fn take_array<const N: usize>(&mut self) -> Option<[u8; N]>;
    fn take_vec(&mut self, n: usize) -> Option<Vec<u8>>;
}

impl<I> TakeBytes for I
where
    I: Iterator<Item = u8>,
{
    fn take_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let mut out = [0u8; N];
        for slot in out.iter_mut() {
            *slot = self.next()?;
        }
        Some(out)
    }

    fn take_vec(&mut self, n: usize) -> Option<Vec<u8>> {
        let out: Vec<u8> = self.by_ref().take(n).collect();
        (out.len() == n).then_some(out)
    }
}
