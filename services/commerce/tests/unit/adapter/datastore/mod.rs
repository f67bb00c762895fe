mod in_mem;
