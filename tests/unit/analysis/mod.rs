mod dct;
