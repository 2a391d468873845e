use crate::codec::FeatureCodec;
use crate::engine::OverlapQueryEngine;
use crate::errors::Result;

///
/// A source of genomic features that can be queried by window.
///
/// Callers that only need features, such as the CLI, depend on this trait instead
/// of a concrete engine.
///
pub trait FeatureSource {
    type Feature;

    fn features<'a>(
        &'a mut self,
        chr: &str,
        start: i64,
        end: i64,
    ) -> Result<Box<dyn Iterator<Item = Result<Self::Feature>> + 'a>>;

    fn sequence_names(&self) -> Result<Vec<String>>;

    fn feature_window_size(&self) -> i64;

    fn set_feature_window_size(&mut self, size: i64);
}

impl<C: FeatureCodec> FeatureSource for OverlapQueryEngine<'_, C> {
    type Feature = C::Feature;

    fn features<'a>(
        &'a mut self,
        chr: &str,
        start: i64,
        end: i64,
    ) -> Result<Box<dyn Iterator<Item = Result<Self::Feature>> + 'a>> {
        Ok(Box::new(self.query(chr, start, end)?))
    }

    fn sequence_names(&self) -> Result<Vec<String>> {
        OverlapQueryEngine::sequence_names(self)
    }

    fn feature_window_size(&self) -> i64 {
        OverlapQueryEngine::feature_window_size(self)
    }

    fn set_feature_window_size(&mut self, size: i64) {
        OverlapQueryEngine::set_feature_window_size(self, size)
    }
}
