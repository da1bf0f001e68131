/// Downstream target of a playback engine.
///
/// Text is cumulative: every `update` carries everything delivered so far,
/// e.g. `"Hel"` -> `"Hello"` -> `"Hello, world!"`.
pub trait IncrementalTextConsumer {
    /// Push the text delivered so far.
    fn update(&mut self, content: &str);

    /// Notify the consumer that the text is complete. Called at most once.
    fn close(&mut self);
}

impl<C: IncrementalTextConsumer + ?Sized> IncrementalTextConsumer for Box<C> {
    fn update(&mut self, content: &str) {
        (**self).update(content);
    }

    fn close(&mut self) {
        (**self).close();
    }
}

/// Adapts a pair of closures into a consumer.
pub struct FnConsumer<U, C> {
    on_update: U,
    on_close: C,
}

impl<U, C> FnConsumer<U, C>
where
    U: FnMut(&str),
    C: FnMut(),
{
    pub fn new(on_update: U, on_close: C) -> Self {
        Self {
            on_update,
            on_close,
        }
    }
}

impl<U, C> IncrementalTextConsumer for FnConsumer<U, C>
where
    U: FnMut(&str),
    C: FnMut(),
{
    fn update(&mut self, content: &str) {
        (self.on_update)(content);
    }

    fn close(&mut self) {
        (self.on_close)();
    }
}
