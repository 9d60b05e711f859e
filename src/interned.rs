/// Interned message identity: `(context, source, disambiguation comment)`.
#[salsa::interned]
pub struct MessageKey {
    #[returns(ref)]
    pub context: String,
    #[returns(ref)]
    pub source: String,
    #[returns(ref)]
    pub comment: Option<String>,
}
