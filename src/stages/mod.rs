/*!
# Stages
One module per step of a case study run, in the order they execute.
*/

/// Working folders and host packages
pub mod environment;
/// Dataset and model downloads
pub mod fetch;
/// Pipeline image build or pull
pub mod provision;
/// The DeepVariant / DeepTrio container run
pub mod pipeline;
/// Reference decompression and hap.py
pub mod evaluate;
/// GLnexus joint genotyping for trios
pub mod trio_merge;
/// RTG Tools Mendelian consistency check for trios
pub mod mendelian;
