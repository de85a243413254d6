pub mod lineage;
