use crate::types::push::PushMessage;

pub trait PushSender: Clone + Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;
    type Fut<'a>: Future<Output = Result<(), Self::Error>> + Send + 'a
    where
        Self: 'a;

    fn send<'a>(&'a self, message: &'a PushMessage) -> Self::Fut<'a>;
}
