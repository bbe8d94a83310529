//! Rendering of pass errors against the template sources.

mod printer;


pub use printer::ErrorPrinter;

impl crate::Error {
    pub fn printer(&self) -> ErrorPrinter<'_, '_> {
        ErrorPrinter::new(self)
    }
}
