/// Builds a [`CompoundTag`](crate::CompoundTag) from `name => value` pairs.
///
/// Values are anything that converts into a [`Tag`](crate::Tag). The compound is
/// built with a strict builder, so the macro returns a
/// [`Result`](crate::Result): a repeated name or an END value is an error.
///
/// ```rust
/// use nbt_stream::{compound, Tag};
///
/// let player = compound! {
///     "name" => "Steve",
///     "health" => 20.0f32,
///     "inventory" => compound! { "slots" => 36 }?,
/// }?;
/// assert_eq!(player.get("health"), Some(&Tag::Float(20.0)));
///
/// assert!(compound! { "a" => 1, "a" => 2 }.is_err());
/// # Ok::<(), nbt_stream::Error>(())
/// ```
#[macro_export]
macro_rules! compound {
    () => {
        $crate::Result::Ok($crate::CompoundTag::new())
    };

    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut builder = $crate::CompoundTag::builder();
        let mut outcome: $crate::Result<()> = Ok(());
        $(
            if outcome.is_ok() {
                outcome = builder.put($name, $value).map(|_| ());
            }
        )+
        outcome.map(|()| builder.build())
    }};
}
