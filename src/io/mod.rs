mod counter;

pub use counter::CountingWriter;
